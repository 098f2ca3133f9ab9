//! # Loopback Session Example
//!
//! Plays a short game against an in-process fake game service, using a
//! custom [`Transport`] built on channels. Useful for:
//!
//! - **Testing**: drive game UI logic without the real services
//! - **Custom backends**: the same trait adapts any message-based I/O layer
//!
//! ## Running
//!
//! ```sh
//! cargo run --example loopback_session
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use battleship_client::protocol::{Board, Boards, Cell, ClientCommand, ServerEvent};
use battleship_client::{
    BattleshipError, GameScreen, GameSession, Route, ScreenConfig, SessionConfig, SessionEvent,
    SessionIdentity, Transport,
};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: A channel-based "loopback" transport
// ─────────────────────────────────────────────────────────────────────

/// Client half: handed to `GameSession::start`.
pub struct LoopbackTransport {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Server half: reads what the client sent, answers as the game service.
pub struct LoopbackServer {
    pub rx: mpsc::UnboundedReceiver<String>,
    pub tx: mpsc::UnboundedSender<String>,
}

fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            tx: client_tx,
            rx: client_rx,
        },
        LoopbackServer {
            rx: server_rx,
            tx: server_tx,
        },
    )
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), BattleshipError> {
        self.tx
            .send(message)
            .map_err(|e| BattleshipError::TransportSend(e.to_string()))
    }

    /// Cancel-safe: `UnboundedReceiver::recv` is.
    async fn recv(&mut self) -> Option<Result<String, BattleshipError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), BattleshipError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: A tiny game service
// ─────────────────────────────────────────────────────────────────────

/// Two 4×4 boards; bob has a single two-square ship at (1,1)-(1,2).
fn initial_boards() -> Boards {
    let mut own = vec![vec![Cell::Water; 4]; 4];
    let mut opponent = vec![vec![Cell::Water; 4]; 4];
    if let Some(row) = own.get_mut(0) {
        row.fill(Cell::Ship);
    }
    for col in [1, 2] {
        if let Some(cell) = opponent.get_mut(1).and_then(|row| row.get_mut(col)) {
            *cell = Cell::Ship;
        }
    }
    Boards {
        own: Board::from(own),
        opponent: Board::from(opponent),
    }
}

async fn run_fake_service(mut server: LoopbackServer) -> Result<(), Box<dyn std::error::Error>> {
    let send = |event: &ServerEvent| -> Result<(), Box<dyn std::error::Error>> {
        server.tx.send(serde_json::to_string(event)?)?;
        Ok(())
    };

    let mut boards = initial_boards();
    send(&ServerEvent::Connected {
        boards: None,
        current_turn: None,
        message: Some("waiting_for_game".into()),
        game_id: None,
    })?;
    send(&ServerEvent::GameCreated {
        boards: boards.clone(),
        current_turn: Some("alice".into()),
        game_id: Some("R1".into()),
        players: vec!["alice".into(), "bob".into()],
    })?;

    let mut hits = 0;
    while let Some(raw) = server.rx.recv().await {
        let ClientCommand::Move {
            player_name,
            row,
            col,
            ..
        } = serde_json::from_str(&raw)?;
        tracing::info!("service received shot at ({row}, {col}) from {player_name}");

        let Some(cell) = boards.opponent.0.get_mut(row).and_then(|r| r.get_mut(col)) else {
            continue;
        };
        let result = if *cell == Cell::Ship {
            *cell = Cell::Hit;
            hits += 1;
            if hits == 2 {
                "sunk Destroyer — alice wins!"
            } else {
                "hit"
            }
        } else {
            *cell = Cell::Miss;
            "miss"
        };
        let winner = (hits == 2).then(|| "alice".to_string());
        send(&ServerEvent::MoveMade {
            boards: boards.clone(),
            // Bob "passes" instantly so the demo stays single-player.
            current_turn: Some("alice".into()),
            winner,
            game_id: Some("R1".into()),
            by: Some(player_name),
            row: Some(row),
            col: Some(col),
            result: Some(result.into()),
        })?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Wire the screen to the fake service
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, server) = loopback_pair();
    tokio::spawn(async move {
        if let Err(e) = run_fake_service(server).await {
            tracing::error!("fake service failed: {e}");
        }
    });

    let (session, mut events) = GameSession::start(
        transport,
        SessionIdentity::new("R1", "alice"),
        SessionConfig::default(),
    );
    let (nav_tx, mut routes) = mpsc::unbounded_channel::<Route>();
    let config = ScreenConfig::default().with_win_redirect_delay(Duration::from_secs(1));
    let screen = GameScreen::mount(session, Arc::new(nav_tx), config);

    // Alice's plan: one miss, then the whole ship.
    let mut shots = vec![(1, 2), (1, 1), (0, 0)];
    let mut redirected_to = None;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    SessionEvent::GameStarted { .. } | SessionEvent::MoveResolved { .. } => {
                        let view = screen.view();
                        println!("{}\n{}", view.status_line(), view.enemy_board);
                        if view.is_my_turn {
                            if let Some((row, col)) = shots.pop() {
                                screen.click_opponent_cell(row, col);
                            }
                        }
                    }
                    SessionEvent::GameWon { winner } => {
                        tracing::info!("{winner} won; waiting for the lobby redirect");
                    }
                    SessionEvent::Disconnected { reason } => {
                        tracing::warn!("Disconnected: {}", reason.as_deref().unwrap_or("clean"));
                        break;
                    }
                    other => tracing::debug!("Event: {other:?}"),
                }
            }
            route = routes.recv() => {
                redirected_to = route.map(|r| r.to_string());
                break;
            }
        }
    }

    screen.unmount().await;
    tracing::info!(?redirected_to, "game over, screen unmounted");
    Ok(())
}
