#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for Battleship client integration tests.
//!
//! Provides a scripted [`MockTransport`], a live [`ChannelTransport`] driven
//! by the test, and helpers that build game-service event JSON.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use battleship_client::protocol::{Board, Boards, Cell, ServerEvent};
use battleship_client::{BattleshipError, Transport};
use tokio::sync::mpsc;

// ── MockTransport ───────────────────────────────────────────────────

/// A scripted mock transport.
///
/// Scripted server frames are consumed in order by `recv()`. All messages
/// sent by the client are recorded in `sent`.
pub struct MockTransport {
    incoming: VecDeque<Option<Result<String, BattleshipError>>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    /// Returns the transport plus shared handles for inspecting sent messages
    /// and whether close was called.
    pub fn new(
        incoming: Vec<Option<Result<String, BattleshipError>>>,
    ) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming: VecDeque::from(incoming),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, sent, closed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), BattleshipError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, BattleshipError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // Out of script: stay open until shutdown.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), BattleshipError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── ChannelTransport ────────────────────────────────────────────────

/// A transport whose server side is held by the test.
///
/// Frames pushed into [`GameServer::push`] arrive at the client in order;
/// dropping the `GameServer` closes the connection from the service side.
pub struct ChannelTransport {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

/// Server end of a [`ChannelTransport`].
pub struct GameServer {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
    pub closed: Arc<AtomicBool>,
}

impl GameServer {
    pub fn push(&self, frame: impl Into<String>) {
        self.to_client.send(frame.into()).unwrap();
    }

    /// Next message the client sent, parsed as JSON.
    pub async fn next_command(&mut self) -> serde_json::Value {
        let text = self.from_client.recv().await.expect("client sent nothing");
        serde_json::from_str(&text).unwrap()
    }

    /// `true` if the client has not sent anything that was not yet read.
    pub fn nothing_sent(&mut self) -> bool {
        self.from_client.try_recv().is_err()
    }
}

pub fn channel_transport() -> (ChannelTransport, GameServer) {
    let (to_client, inbound) = mpsc::unbounded_channel();
    let (outbound, from_client) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        ChannelTransport {
            inbound,
            outbound,
            closed: Arc::clone(&closed),
        },
        GameServer {
            to_client,
            from_client,
            closed,
        },
    )
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, message: String) -> Result<(), BattleshipError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(BattleshipError::TransportClosed);
        }
        self.outbound
            .send(message)
            .map_err(|e| BattleshipError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, BattleshipError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), BattleshipError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── Boards ──────────────────────────────────────────────────────────

/// Parse a board from rows of symbols, e.g. `["O~", "XM"]`.
pub fn board(rows: &[&str]) -> Board {
    Board::from(
        rows.iter()
            .map(|row| {
                row.chars()
                    .map(|c| Cell::from_symbol(&c.to_string()))
                    .collect()
            })
            .collect::<Vec<Vec<Cell>>>(),
    )
}

pub fn boards(own: &[&str], opponent: &[&str]) -> Boards {
    Boards {
        own: board(own),
        opponent: board(opponent),
    }
}

/// A 12×12 board of water with a ship at each given square.
pub fn fleet(ships: &[(usize, usize)]) -> Board {
    let mut rows = vec![vec![Cell::Water; 12]; 12];
    for &(row, col) in ships {
        rows[row][col] = Cell::Ship;
    }
    Board::from(rows)
}

// ── JSON helper functions ───────────────────────────────────────────

/// `connected` with no game yet.
pub fn connected_json() -> String {
    serde_json::to_string(&ServerEvent::Connected {
        boards: None,
        current_turn: None,
        message: Some("waiting_for_game".into()),
        game_id: None,
    })
    .expect("connected_json serialization")
}

/// `connected` for a game already in progress.
pub fn connected_in_game_json(boards: &Boards, current_turn: &str) -> String {
    serde_json::to_string(&ServerEvent::Connected {
        boards: Some(boards.clone()),
        current_turn: Some(current_turn.into()),
        message: None,
        game_id: Some("R1".into()),
    })
    .expect("connected_in_game_json serialization")
}

pub fn game_created_json(boards: &Boards, current_turn: &str) -> String {
    serde_json::to_string(&ServerEvent::GameCreated {
        boards: boards.clone(),
        current_turn: Some(current_turn.into()),
        game_id: Some("R1".into()),
        players: vec!["alice".into(), "bob".into()],
    })
    .expect("game_created_json serialization")
}

pub fn move_made_json(boards: &Boards, current_turn: &str, winner: Option<&str>) -> String {
    move_made_json_with(boards, current_turn, winner, None)
}

pub fn move_made_json_with(
    boards: &Boards,
    current_turn: &str,
    winner: Option<&str>,
    result: Option<&str>,
) -> String {
    serde_json::to_string(&ServerEvent::MoveMade {
        boards: boards.clone(),
        current_turn: Some(current_turn.into()),
        winner: winner.map(Into::into),
        game_id: Some("R1".into()),
        by: None,
        row: None,
        col: None,
        result: result.map(Into::into),
    })
    .expect("move_made_json serialization")
}
