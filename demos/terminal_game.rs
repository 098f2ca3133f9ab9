//! # Terminal Game Example
//!
//! A line-oriented Battleship client against the real services:
//!
//! 1. Register or log in with a username
//! 2. Create or join a room; the host starts the game
//! 3. Wait for the room to start, connect to the game socket and shoot
//! 4. Return to the lobby a few seconds after someone wins
//!
//! ## Running
//!
//! ```sh
//! # Start the user, room and game services, then:
//! cargo run --example terminal_game
//!
//! # Point at other hosts:
//! BATTLESHIP_ROOM_URL=http://rooms:8003 cargo run --example terminal_game
//! ```

use std::sync::Arc;

use battleship_client::config::POLL_INTERVAL;
use battleship_client::{
    BattleshipError, GameScreen, GameSession, HttpConfig, RoomPoller, RoomServiceClient,
    RoomSummary, Route, ScreenConfig, ServiceEndpoints, SessionContext, SessionEvent,
    SessionIdentity, UserServiceClient,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};

const HELP: &str = "\
commands:
  register <name>    create an account and log in
  login <name>       log in
  logout             log out
  users              list registered users
  rooms              list rooms
  create <room>      create a room as host
  join <room>        join a room as guest
  start <room>       start the game (host only)
  wait <room>        watch a room until its game starts, then connect
  connect <room>     connect to the game socket now
  shoot <row> <col>  fire at the opponent's board
  board              show both boards
  leave              leave the game
  help               this text
  exit               quit";

type Screen = GameScreen<mpsc::UnboundedSender<Route>>;

struct App {
    endpoints: ServiceEndpoints,
    users: UserServiceClient,
    rooms: RoomServiceClient,
    ctx: SessionContext,
    nav_tx: mpsc::UnboundedSender<Route>,
    screen: Option<Screen>,
    events: Option<mpsc::Receiver<SessionEvent>>,
    poller: Option<RoomPoller>,
    started: Option<oneshot::Receiver<RoomSummary>>,
}

impl App {
    fn new(
        endpoints: ServiceEndpoints,
        nav_tx: mpsc::UnboundedSender<Route>,
    ) -> Result<Self, BattleshipError> {
        let http = HttpConfig::default();
        Ok(Self {
            users: UserServiceClient::new(endpoints.clone(), &http)?,
            rooms: RoomServiceClient::new(endpoints.clone(), &http)?,
            endpoints,
            ctx: SessionContext::new(),
            nav_tx,
            screen: None,
            events: None,
            poller: None,
            started: None,
        })
    }

    /// Run one command line. Returns `false` on `exit`.
    async fn handle(&mut self, line: &str) -> Result<bool, BattleshipError> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(true);
        };
        let arg = words.next().unwrap_or_default();

        match command {
            "register" => println!("{}", self.ctx.register(&self.users, arg).await?),
            "login" => println!("{}", self.ctx.login(&self.users, arg).await?),
            "logout" => {
                self.leave().await;
                self.ctx.logout();
                println!("logged out");
            }
            "users" => println!("{}", self.users.list_users().await?.join(", ")),
            "rooms" => {
                let mut rooms: Vec<_> = self.rooms.list_rooms().await?.into_iter().collect();
                rooms.sort_by(|a, b| a.0.cmp(&b.0));
                if rooms.is_empty() {
                    println!("no rooms");
                }
                for (id, room) in rooms {
                    let guest = room.guest.as_deref().unwrap_or("-");
                    println!("{id:10} host={} guest={guest} status={}", room.host, room.status);
                }
            }
            "create" => {
                let user = self.ctx.require_user()?.to_string();
                println!("{}", self.rooms.create_room(arg, &user).await?);
            }
            "join" => {
                let user = self.ctx.require_user()?.to_string();
                println!("{}", self.rooms.join_room(arg, &user).await?);
            }
            "start" => {
                let user = self.ctx.require_user()?.to_string();
                println!("{}", self.rooms.start_game(arg, &user).await?.message);
            }
            "wait" => {
                self.ctx.require_user()?;
                let (poller, started) = RoomPoller::spawn(self.rooms.clone(), arg, POLL_INTERVAL);
                self.poller = Some(poller);
                self.started = Some(started);
                println!("waiting for room {arg} to start...");
            }
            "connect" => self.connect(arg).await?,
            "shoot" => {
                let row = arg.parse::<usize>();
                let col = words.next().unwrap_or_default().parse::<usize>();
                let (Ok(row), Ok(col)) = (row, col) else {
                    return Err(BattleshipError::InvalidInput("usage: shoot <row> <col>"));
                };
                match &self.screen {
                    Some(screen) if screen.click_opponent_cell(row, col) => {}
                    Some(screen) => println!("{}", screen.view().status_line()),
                    None => println!("not in a game"),
                }
            }
            "board" => self.print_boards(),
            "leave" => self.leave().await,
            "help" => println!("{HELP}"),
            "exit" | "quit" => return Ok(false),
            other => println!("unknown command {other:?}, try help"),
        }
        Ok(true)
    }

    async fn connect(&mut self, room_id: &str) -> Result<(), BattleshipError> {
        let player = self.ctx.require_user()?.to_string();
        let identity = SessionIdentity::new(room_id, player);
        let config = ScreenConfig::default();

        if let Some(screen) = self.screen.as_mut() {
            let endpoints = self.endpoints.clone();
            if let Some(events) = screen
                .rebind(identity, |identity, session| {
                    GameSession::open(&endpoints, identity, session)
                })
                .await
            {
                self.events = Some(events);
            }
            return Ok(());
        }

        let (session, events) =
            GameSession::open(&self.endpoints, identity, config.session.clone());
        self.screen = Some(GameScreen::mount(session, Arc::new(self.nav_tx.clone()), config));
        self.events = Some(events);
        Ok(())
    }

    async fn leave(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.shutdown();
        }
        self.started = None;
        self.events = None;
        if let Some(screen) = self.screen.take() {
            screen.unmount().await;
            println!("left the game");
        }
    }

    fn print_boards(&self) {
        let Some(screen) = &self.screen else {
            println!("not in a game");
            return;
        };
        let view = screen.view();
        println!("Your board:\n{}", view.own_board);
        println!("Opponent:\n{}", view.enemy_board);
        println!("{}", view.status_line());
    }

    fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => println!("connected to game service"),
            SessionEvent::Joined { message, .. } => {
                println!("joined: {}", message.as_deref().unwrap_or("game in progress"));
            }
            SessionEvent::GameStarted { players, .. } => {
                println!("game started: {}", players.join(" vs "));
                self.print_boards();
            }
            SessionEvent::MoveResolved { by, row, col, result, .. } => {
                if let (Some(by), Some(row), Some(col), Some(result)) = (by, row, col, result) {
                    println!("{by} fired at ({row}, {col}): {result}");
                }
                self.print_boards();
            }
            SessionEvent::GameWon { winner } => {
                println!("{winner} wins! back to the lobby shortly");
            }
            SessionEvent::Disconnected { reason } => {
                println!("disconnected: {}", reason.as_deref().unwrap_or("closed by service"));
            }
        }
    }
}

async fn recv_event(events: &mut Option<mpsc::Receiver<SessionEvent>>) -> Option<SessionEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn room_started(started: &mut Option<oneshot::Receiver<RoomSummary>>) -> Option<RoomSummary> {
    match started {
        Some(rx) => rx.await.ok(),
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let endpoints = ServiceEndpoints::from_env();
    tracing::info!(?endpoints, "using services");

    let (nav_tx, mut routes) = mpsc::unbounded_channel::<Route>();
    let mut app = App::new(endpoints, nav_tx)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match app.handle(&line).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {}", e.user_message()),
                }
            }

            event = recv_event(&mut app.events) => match event {
                Some(event) => app.on_event(event),
                None => app.events = None,
            },

            room = room_started(&mut app.started) => {
                app.started = None;
                app.poller = None;
                if let Some(room) = room {
                    println!("room {} started", room.room_id);
                    if let Err(e) = app.connect(&room.room_id).await {
                        println!("error: {}", e.user_message());
                    }
                }
            }

            Some(route) = routes.recv() => {
                println!("-> {route}");
                if route == Route::Lobby {
                    app.leave().await;
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    app.leave().await;
    Ok(())
}
