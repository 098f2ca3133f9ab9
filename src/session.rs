//! Game session client: one live connection for one player in one room.
//!
//! [`GameSession`] is a thin handle over a background task that owns the
//! transport. The task applies every inbound event to a [`SessionState`]
//! (published through a [`watch`] channel) and forwards a [`SessionEvent`] on
//! the bounded channel returned by [`GameSession::start`].
//!
//! The session does not know whose turn it is allowed to play: it sends any
//! move it is given while connected. Turn-gating belongs to the caller, see
//! [`GameScreen`](crate::game_screen::GameScreen).
//!
//! # Example
//!
//! ```rust,ignore
//! let identity = SessionIdentity::new("R1", "alice");
//! let (session, mut events) =
//!     GameSession::open(&ServiceEndpoints::default(), identity, SessionConfig::default());
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         SessionEvent::GameStarted { .. } => println!("{:?}", session.state().current_turn),
//!         SessionEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::event::SessionEvent;
use crate::protocol::{parse_server_event, Boards, ClientCommand, PlayerName, RoomId, ServerEvent};
use crate::transport::Transport;

// ── Identity ────────────────────────────────────────────────────────

/// The `(room, player)` pair a session is bound to for its whole life.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity {
    pub room_id: RoomId,
    pub player: PlayerName,
}

impl SessionIdentity {
    pub fn new(room_id: impl Into<RoomId>, player: impl Into<PlayerName>) -> Self {
        Self {
            room_id: room_id.into(),
            player: player.into(),
        }
    }

    /// `true` when both the room and the player are known.
    pub fn is_bound(&self) -> bool {
        !self.room_id.trim().is_empty() && !self.player.trim().is_empty()
    }
}

// ── State ───────────────────────────────────────────────────────────

/// Transport lifecycle, independent of game progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Local view of one game, as last reported by the game service.
///
/// `boards`, `current_turn` and `winner` are only ever replaced wholesale by
/// [`apply`](Self::apply); a board is never patched cell by cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub connection: ConnectionStatus,
    /// Whose shot the service accepts next. `None` until declared.
    pub current_turn: Option<PlayerName>,
    /// Sticky once set.
    pub winner: Option<PlayerName>,
    /// `None` until the first snapshot.
    pub boards: Option<Boards>,
}

impl SessionState {
    /// Apply one inbound event, last write wins.
    ///
    /// Returns `true` if this event declared the winner for the first time.
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::Connected {
                boards,
                current_turn,
                ..
            } => {
                if let Some(boards) = boards {
                    self.boards = Some(boards.clone());
                }
                self.current_turn = current_turn.clone();
                false
            }
            ServerEvent::GameCreated {
                boards,
                current_turn,
                ..
            } => {
                self.boards = Some(boards.clone());
                self.current_turn = current_turn.clone();
                false
            }
            ServerEvent::MoveMade {
                boards,
                current_turn,
                winner,
                ..
            } => {
                self.boards = Some(boards.clone());
                self.current_turn = current_turn.clone();
                match winner {
                    Some(winner) => {
                        let first = self.winner.is_none();
                        self.winner = Some(winner.clone());
                        first
                    }
                    None => false,
                }
            }
        }
    }

    /// `true` once a winner has been declared.
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// `true` if the service has declared it `player`'s turn.
    pub fn is_turn_of(&self, player: &str) -> bool {
        self.current_turn.as_deref() == Some(player)
    }
}

// ── Session handle ──────────────────────────────────────────────────

/// Handle to a running game session.
///
/// Dropping the handle aborts the background task, which drops the
/// transport. Prefer [`shutdown`](Self::shutdown) for a graceful close.
pub struct GameSession {
    identity: SessionIdentity,
    cmd_tx: mpsc::UnboundedSender<ClientCommand>,
    state: Arc<watch::Sender<SessionState>>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: std::time::Duration,
}

impl GameSession {
    /// Open a WebSocket session to the game service for `identity`.
    ///
    /// Returns immediately in [`ConnectionStatus::Connecting`]; the connect
    /// itself runs on the session task. A failed connect ends in
    /// [`SessionEvent::Disconnected`] with the reason. No automatic retry.
    #[cfg(feature = "transport-websocket")]
    #[must_use = "the event receiver must be used to receive events"]
    pub fn open(
        endpoints: &crate::config::ServiceEndpoints,
        identity: SessionIdentity,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let url = endpoints.game_socket_url(&identity.room_id, &identity.player);
        let connect = async move {
            let url = url?;
            crate::transports::WebSocketTransport::connect(url.as_str()).await
        };
        Self::start_with(connect, identity, config)
    }

    /// Start a session over an already-connected transport.
    ///
    /// With an unbound identity the transport is closed right away.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start<T: Transport>(
        mut transport: T,
        identity: SessionIdentity,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        if !identity.is_bound() {
            tokio::spawn(async move {
                if let Err(e) = transport.close().await {
                    debug!(error = %e, "closing unused transport failed");
                }
            });
            return Self::start_with(std::future::pending::<Result<T>>(), identity, config);
        }
        Self::start_with(async move { Ok(transport) }, identity, config)
    }

    /// Start a session whose transport is produced by `connect`.
    ///
    /// The state is `Connecting` until `connect` resolves. An unbound
    /// identity never connects: `connect` is dropped without being polled,
    /// the session stays `Disconnected` and the event channel yields a
    /// single `Disconnected` event.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start_with<F, T>(
        connect: F,
        identity: SessionIdentity,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<SessionEvent>)
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Transport,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientCommand>();
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (state, _) = watch::channel(SessionState::default());
        let state = Arc::new(state);

        let task = if identity.is_bound() {
            state.send_modify(|s| s.connection = ConnectionStatus::Connecting);
            Some(tokio::spawn(run_session(
                connect,
                cmd_rx,
                event_tx,
                Arc::clone(&state),
                shutdown_rx,
                identity.clone(),
            )))
        } else {
            warn!(
                room = %identity.room_id,
                player = %identity.player,
                "session identity incomplete, not connecting"
            );
            let _ = event_tx.try_send(SessionEvent::Disconnected {
                reason: Some("no room or player bound".into()),
            });
            None
        };

        let session = Self {
            identity,
            cmd_tx,
            state,
            task,
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };
        (session, event_rx)
    }

    // ── Public API ──────────────────────────────────────────────────

    /// Fire at `(row, col)` on the opponent's board.
    ///
    /// Does nothing and returns `false` unless the session is connected with
    /// a bound identity. Otherwise the move is queued, whoever's turn it is,
    /// and `true` is returned; the game service is the judge.
    pub fn submit_move(&self, row: usize, col: usize) -> bool {
        if !self.identity.is_bound() {
            debug!("move dropped: no identity bound");
            return false;
        }
        if self.connection_status() != ConnectionStatus::Connected {
            debug!(row, col, "move dropped: session not connected");
            return false;
        }
        let command = ClientCommand::Move {
            player_name: self.identity.player.clone(),
            row,
            col,
            room_id: self.identity.room_id.clone(),
        };
        self.cmd_tx.send(command).is_ok()
    }

    /// Close the transport and stop the background task.
    ///
    /// The task gets `shutdown_timeout` to close the transport and emit
    /// `Disconnected`; after that it is aborted.
    pub async fn shutdown(&mut self) {
        debug!(room = %self.identity.room_id, "session shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("session task terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("session task did not exit within timeout; aborting");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("session task aborted: {join_err}");
                    }
                }
            }
        }

        self.state
            .send_modify(|s| s.connection = ConnectionStatus::Disconnected);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch the state; the receiver sees every update.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.state.borrow().connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status() == ConnectionStatus::Connected
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("identity", &self.identity)
            .field("connection", &self.connection_status())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        // No executor to drive an async close from here; aborting drops the
        // transport, which closes the socket.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Session task ────────────────────────────────────────────────────

async fn run_session<F, T>(
    connect: F,
    cmd_rx: mpsc::UnboundedReceiver<ClientCommand>,
    event_tx: mpsc::Sender<SessionEvent>,
    state: Arc<watch::Sender<SessionState>>,
    mut shutdown_rx: oneshot::Receiver<()>,
    identity: SessionIdentity,
) where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Transport,
{
    let transport = tokio::select! {
        connected = connect => match connected {
            Ok(transport) => transport,
            Err(e) => {
                error!(room = %identity.room_id, player = %identity.player, "connect failed: {e}");
                emit_disconnected(&event_tx, &state, Some(format!("connect failed: {e}"))).await;
                return;
            }
        },
        _ = &mut shutdown_rx => {
            debug!("shutdown requested while connecting");
            emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
            return;
        }
    };

    info!(room = %identity.room_id, player = %identity.player, "game session connected");
    state.send_modify(|s| s.connection = ConnectionStatus::Connected);
    emit_event(&event_tx, SessionEvent::Connected);

    transport_loop(transport, cmd_rx, event_tx, state, shutdown_rx).await;
}

/// Multiplex outgoing commands, shutdown and inbound frames.
///
/// Exits on shutdown, when the handle is dropped, when the service closes
/// the socket, or on a transport error.
async fn transport_loop(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientCommand>,
    event_tx: mpsc::Sender<SessionEvent>,
    state: Arc<watch::Sender<SessionState>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("transport loop started");

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(command) = cmd else {
                    debug!("command channel closed, shutting down transport loop");
                    let _ = transport.close().await;
                    emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                    break;
                };
                match serde_json::to_string(&command) {
                    Ok(json) => {
                        debug!(%json, "sending command");
                        if let Err(e) = transport.send(json).await {
                            error!("transport send error: {e}");
                            let _ = transport.close().await;
                            emit_disconnected(
                                &event_tx,
                                &state,
                                Some(format!("transport send error: {e}")),
                            ).await;
                            break;
                        }
                    }
                    Err(e) => error!("failed to serialize command: {e}"),
                }
            }

            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &state, Some("client shut down".into())).await;
                break;
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        for event in handle_inbound(&state, &text) {
                            emit_event(&event_tx, event);
                        }
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        let _ = transport.close().await;
                        emit_disconnected(
                            &event_tx,
                            &state,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    None => {
                        debug!("transport closed by game service");
                        emit_disconnected(&event_tx, &state, None).await;
                        break;
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Apply one inbound frame to `state` and return the events it produces.
///
/// Frames that are not a known event leave the state untouched.
fn handle_inbound(state: &watch::Sender<SessionState>, text: &str) -> Vec<SessionEvent> {
    let Some(event) = parse_server_event(text) else {
        return Vec::new();
    };

    let mut won = false;
    state.send_modify(|s| won = s.apply(&event));
    debug!(kind = event.kind(), "applied game event");

    let mut events = vec![SessionEvent::from(&event)];
    if won {
        if let ServerEvent::MoveMade {
            winner: Some(winner),
            ..
        } = &event
        {
            info!(%winner, "game won");
            events.push(SessionEvent::GameWon {
                winner: winner.clone(),
            });
        }
    }
    events
}

/// Forward an event without blocking; a full channel drops it with a warning.
fn emit_event(event_tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!("event channel full, dropping event: {dropped:?}");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Mark the session disconnected and deliver the final event.
///
/// Awaits channel capacity: `Disconnected` is never dropped.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<SessionEvent>,
    state: &watch::Sender<SessionState>,
    reason: Option<String>,
) {
    state.send_modify(|s| s.connection = ConnectionStatus::Disconnected);
    if event_tx
        .send(SessionEvent::Disconnected { reason })
        .await
        .is_err()
    {
        debug!("event channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::error::BattleshipError;
    use crate::protocol::{Board, Cell};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Records sent messages and replays scripted responses.
    struct MockTransport {
        incoming: VecDeque<Option<std::result::Result<String, BattleshipError>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        #[allow(clippy::type_complexity)]
        fn new(
            incoming: Vec<Option<std::result::Result<String, BattleshipError>>>,
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
        async fn send(&mut self, message: String) -> std::result::Result<(), BattleshipError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, BattleshipError>> {
            match self.incoming.pop_front() {
                Some(item) => item,
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> std::result::Result<(), BattleshipError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    fn boards(own: Cell, opponent: Cell) -> Boards {
        Boards {
            own: Board(vec![vec![own; 2]; 2]),
            opponent: Board(vec![vec![opponent; 2]; 2]),
        }
    }

    fn move_made(turn: &str, winner: Option<&str>, cell: Cell) -> ServerEvent {
        ServerEvent::MoveMade {
            boards: boards(Cell::Ship, cell),
            current_turn: Some(turn.into()),
            winner: winner.map(Into::into),
            game_id: None,
            by: None,
            row: None,
            col: None,
            result: None,
        }
    }

    // ── Reducer ─────────────────────────────────────────────────────

    #[test]
    fn connected_without_boards_keeps_boards_unset() {
        let mut state = SessionState::default();
        state.apply(&ServerEvent::Connected {
            boards: None,
            current_turn: None,
            message: Some("waiting_for_game".into()),
            game_id: None,
        });
        assert_eq!(state.boards, None);
        assert_eq!(state.current_turn, None);
    }

    #[test]
    fn last_write_wins_for_boards_and_turn() {
        let mut state = SessionState::default();
        state.apply(&move_made("alice", None, Cell::Miss));
        state.apply(&move_made("bob", None, Cell::Hit));
        assert_eq!(state.current_turn.as_deref(), Some("bob"));
        assert_eq!(state.boards, Some(boards(Cell::Ship, Cell::Hit)));
    }

    #[test]
    fn winner_is_sticky_and_reported_once() {
        let mut state = SessionState::default();
        assert!(!state.apply(&move_made("bob", None, Cell::Hit)));
        assert!(state.apply(&move_made("bob", Some("bob"), Cell::Hit)));
        assert!(!state.apply(&move_made("bob", None, Cell::Hit)));
        assert_eq!(state.winner.as_deref(), Some("bob"));
        assert!(!state.apply(&move_made("bob", Some("bob"), Cell::Hit)));
        assert!(state.is_finished());
    }

    #[test]
    fn malformed_frames_leave_state_untouched() {
        let (state, _rx) = watch::channel(SessionState::default());
        handle_inbound(
            &state,
            &serde_json::to_string(&move_made("alice", None, Cell::Miss)).unwrap(),
        );
        let before = state.borrow().clone();

        for frame in ["not json", r#"{"current_turn":"bob"}"#, r#"{"event":"ack"}"#] {
            assert!(handle_inbound(&state, frame).is_empty());
            assert_eq!(*state.borrow(), before);
        }
    }

    #[test]
    fn identity_binding() {
        assert!(SessionIdentity::new("R1", "alice").is_bound());
        assert!(!SessionIdentity::new("", "alice").is_bound());
        assert!(!SessionIdentity::new("R1", "  ").is_bound());
    }

    // ── Session task ────────────────────────────────────────────────

    #[tokio::test]
    async fn move_is_serialized_with_identity() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let (mut session, mut events) = GameSession::start(
            transport,
            SessionIdentity::new("R1", "alice"),
            SessionConfig::default(),
        );

        assert_eq!(events.recv().await, Some(SessionEvent::Connected));
        assert!(session.submit_move(3, 4));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        {
            let messages = sent.lock().unwrap();
            let json: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "action": "move",
                    "player_name": "alice",
                    "row": 3,
                    "col": 4,
                    "room_id": "R1",
                })
            );
        }

        session.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_transport() {
        let (transport, _sent, closed) = MockTransport::new(vec![]);
        let (mut session, mut events) = GameSession::start(
            transport,
            SessionIdentity::new("R1", "alice"),
            SessionConfig::default(),
        );
        let _ = events.recv().await; // Connected

        session.shutdown().await;
        assert!(closed.load(Ordering::Relaxed));
        assert_eq!(session.connection_status(), ConnectionStatus::Disconnected);
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Disconnected { .. })
        ));
        assert!(!session.submit_move(0, 0));
    }

    #[tokio::test]
    async fn unbound_identity_never_connects() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let (session, mut events) = GameSession::start(
            transport,
            SessionIdentity::new("R1", ""),
            SessionConfig::default(),
        );
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Disconnected { .. })
        ));
        assert_eq!(session.connection_status(), ConnectionStatus::Disconnected);
        assert!(!session.submit_move(0, 0));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unbound_identity_closes_the_given_transport() {
        let (transport, _sent, closed) = MockTransport::new(vec![]);
        let (_session, mut events) = GameSession::start(
            transport,
            SessionIdentity::new("", "alice"),
            SessionConfig::default(),
        );
        let _ = events.recv().await; // Disconnected

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(closed.load(Ordering::Relaxed));
    }
}
