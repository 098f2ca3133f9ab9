//! Events emitted by a [`GameSession`](crate::session::GameSession).

use crate::protocol::{PlayerName, ServerEvent, ShotResult};

/// Something that happened on a game session.
///
/// Protocol events arrive after the session state has already been updated,
/// so [`GameSession::state`](crate::session::GameSession::state) reflects them
/// by the time the event is received. `Disconnected` is always the last event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The transport is up. Game fields arrive with later events.
    Connected,

    /// The game service accepted the socket.
    Joined {
        /// Status text, e.g. `waiting_for_game`.
        message: Option<String>,
        /// `true` when the service sent boards, i.e. a game is already running.
        game_in_progress: bool,
    },

    /// The host started the game.
    GameStarted {
        players: Vec<PlayerName>,
        current_turn: Option<PlayerName>,
    },

    /// A shot was resolved.
    MoveResolved {
        by: Option<PlayerName>,
        row: Option<usize>,
        col: Option<usize>,
        result: Option<ShotResult>,
        current_turn: Option<PlayerName>,
    },

    /// A winner was declared for the first time in this session.
    GameWon { winner: PlayerName },

    /// The connection ended. `reason` is `None` for a clean close by the service.
    Disconnected { reason: Option<String> },
}

impl From<&ServerEvent> for SessionEvent {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::Connected {
                boards, message, ..
            } => Self::Joined {
                message: message.clone(),
                game_in_progress: boards.is_some(),
            },
            ServerEvent::GameCreated {
                players,
                current_turn,
                ..
            } => Self::GameStarted {
                players: players.clone(),
                current_turn: current_turn.clone(),
            },
            ServerEvent::MoveMade {
                by,
                row,
                col,
                result,
                current_turn,
                ..
            } => Self::MoveResolved {
                by: by.clone(),
                row: *row,
                col: *col,
                result: result.as_deref().map(ShotResult::parse),
                current_turn: current_turn.clone(),
            },
        }
    }
}
