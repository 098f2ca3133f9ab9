//! The in-game screen: turn-gating, board views and the post-game redirect.
//!
//! A [`GameScreen`] owns one [`GameSession`] for the lifetime of the screen.
//! Clicks on the opponent's board only reach the session when it is the
//! local player's turn and no winner has been declared. Once a winner is
//! known the screen schedules a single return to the lobby after
//! [`ScreenConfig::win_redirect_delay`]; unmounting the screen before then
//! cancels it.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::board_view::{render, DisplayGrid};
use crate::config::{ScreenConfig, SessionConfig};
use crate::event::SessionEvent;
use crate::navigation::{Navigator, Route};
use crate::protocol::{PlayerName, RoomId};
use crate::session::{ConnectionStatus, GameSession, SessionIdentity, SessionState};

/// Everything the screen shows, derived from the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub room_id: RoomId,
    pub you: PlayerName,
    pub connection: ConnectionStatus,
    pub current_turn: Option<PlayerName>,
    pub winner: Option<PlayerName>,
    /// The local player's board, ships visible.
    pub own_board: DisplayGrid,
    /// The opponent's board under fog of war.
    pub enemy_board: DisplayGrid,
    pub is_my_turn: bool,
}

impl GameView {
    fn from_state(identity: &SessionIdentity, state: &SessionState) -> Self {
        let boards = state.boards.as_ref();
        Self {
            room_id: identity.room_id.clone(),
            you: identity.player.clone(),
            connection: state.connection,
            current_turn: state.current_turn.clone(),
            winner: state.winner.clone(),
            own_board: render(boards.map(|b| &b.own), false),
            enemy_board: render(boards.map(|b| &b.opponent), true),
            is_my_turn: state.winner.is_none() && state.is_turn_of(&identity.player),
        }
    }

    /// One-line status, e.g. `Your turn` or `Winner: bob`.
    pub fn status_line(&self) -> String {
        if let Some(winner) = &self.winner {
            return format!("Winner: {winner}");
        }
        match (&self.connection, &self.current_turn) {
            (ConnectionStatus::Connecting, _) => "Connecting...".into(),
            (ConnectionStatus::Disconnected, _) => "Disconnected".into(),
            (ConnectionStatus::Connected, None) => "Waiting for the game to start".into(),
            (ConnectionStatus::Connected, Some(_)) if self.is_my_turn => "Your turn".into(),
            (ConnectionStatus::Connected, Some(turn)) => format!("Waiting for {turn}"),
        }
    }
}

/// A mounted game screen.
pub struct GameScreen<N: Navigator> {
    session: GameSession,
    navigator: Arc<N>,
    config: ScreenConfig,
    redirect: Option<JoinHandle<()>>,
}

impl<N: Navigator> GameScreen<N> {
    /// Mount the screen over `session`. The local player is the session's
    /// bound player.
    pub fn mount(session: GameSession, navigator: Arc<N>, config: ScreenConfig) -> Self {
        let redirect = spawn_redirect(
            session.subscribe(),
            Arc::clone(&navigator),
            config.win_redirect_delay,
        );
        debug!(room = %session.identity().room_id, "game screen mounted");
        Self {
            session,
            navigator,
            config,
            redirect: Some(redirect),
        }
    }

    /// Fire at `(row, col)` on the opponent's board.
    ///
    /// Ignored, returning `false`, when the game is over or it is not the
    /// local player's turn. Otherwise the move goes to the session.
    pub fn click_opponent_cell(&self, row: usize, col: usize) -> bool {
        let state = self.session.state();
        let you = &self.session.identity().player;
        if state.is_finished() {
            debug!(row, col, "click ignored: game over");
            return false;
        }
        if !state.is_turn_of(you) {
            debug!(row, col, turn = ?state.current_turn, "click ignored: not your turn");
            return false;
        }
        self.session.submit_move(row, col)
    }

    pub fn view(&self) -> GameView {
        GameView::from_state(self.session.identity(), &self.session.state())
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn local_player(&self) -> &str {
        &self.session.identity().player
    }

    /// Switch to another room or player.
    ///
    /// The current session is shut down before `open` is called for the new
    /// one. Returns `None`, keeping the current session, when `identity` is
    /// unchanged.
    pub async fn rebind<F>(
        &mut self,
        identity: SessionIdentity,
        open: F,
    ) -> Option<mpsc::Receiver<SessionEvent>>
    where
        F: FnOnce(SessionIdentity, SessionConfig) -> (GameSession, mpsc::Receiver<SessionEvent>),
    {
        if *self.session.identity() == identity {
            return None;
        }
        info!(
            room = %identity.room_id,
            player = %identity.player,
            "rebinding game screen"
        );
        self.cancel_redirect();
        self.session.shutdown().await;

        let (session, events) = open(identity, self.config.session.clone());
        self.redirect = Some(spawn_redirect(
            session.subscribe(),
            Arc::clone(&self.navigator),
            self.config.win_redirect_delay,
        ));
        self.session = session;
        Some(events)
    }

    /// Leave the screen: cancel a pending redirect and close the session.
    pub async fn unmount(mut self) {
        self.cancel_redirect();
        self.session.shutdown().await;
        debug!("game screen unmounted");
    }

    fn cancel_redirect(&mut self) {
        if let Some(task) = self.redirect.take() {
            task.abort();
        }
    }
}

impl<N: Navigator> std::fmt::Debug for GameScreen<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameScreen")
            .field("session", &self.session)
            .field("redirect_pending", &self.redirect.is_some())
            .finish()
    }
}

impl<N: Navigator> Drop for GameScreen<N> {
    fn drop(&mut self) {
        self.cancel_redirect();
    }
}

/// Wait for a winner, then navigate to the lobby once after `delay`.
fn spawn_redirect<N: Navigator>(
    mut state: watch::Receiver<SessionState>,
    navigator: Arc<N>,
    delay: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let winner = state
            .wait_for(|s| s.winner.is_some())
            .await
            .map(|s| s.winner.clone());
        // Err: the session went away without a winner.
        let Ok(winner) = winner else {
            return;
        };
        info!(winner = ?winner, "game over, returning to lobby in {delay:?}");
        tokio::time::sleep(delay).await;
        navigator.navigate(Route::Lobby);
    })
}
