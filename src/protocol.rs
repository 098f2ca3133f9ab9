//! Wire types for the Battleship game service.
//!
//! The game service speaks UTF-8 JSON over one WebSocket per player. Inbound
//! messages carry an `event` tag, the single outbound command carries an
//! `action` tag. Boards travel as rows of one-character symbols:
//!
//! | symbol | cell            |
//! |--------|-----------------|
//! | `~`    | [`Cell::Water`] |
//! | `O`    | [`Cell::Ship`]  |
//! | `X`    | [`Cell::Hit`]   |
//! | `M`    | [`Cell::Miss`]  |

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Player identity as used by every service (the username).
pub type PlayerName = String;

/// Room identifier chosen by the room's host.
pub type RoomId = String;

// ── Cells and boards ────────────────────────────────────────────────

/// One square of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Water,
    Ship,
    Hit,
    Miss,
}

impl Cell {
    /// The wire symbol for this cell.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Water => "~",
            Self::Ship => "O",
            Self::Hit => "X",
            Self::Miss => "M",
        }
    }

    /// Decode a wire symbol. Unknown symbols read as water, the same way the
    /// renderer has always drawn them.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "O" => Self::Ship,
            "X" => Self::Hit,
            "M" => Self::Miss,
            _ => Self::Water,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Ok(Self::from_symbol(&symbol))
    }
}

/// A square grid of cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board(pub Vec<Vec<Cell>>);

impl Board {
    /// Number of rows.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.0
    }

    /// The cell at `(row, col)`, if it is on the board.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.0.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Iterate over `(row, col, cell)` for every square.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.0.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (row, col, *cell))
        })
    }
}

impl From<Vec<Vec<Cell>>> for Board {
    fn from(rows: Vec<Vec<Cell>>) -> Self {
        Self(rows)
    }
}

/// Both boards as seen by one player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Boards {
    /// The player's own fleet.
    #[serde(rename = "self")]
    pub own: Board,
    /// The opponent's board.
    pub opponent: Board,
}

// ── Inbound events ──────────────────────────────────────────────────

/// Events pushed by the game service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once when the socket is accepted. Carries the current game if one
    /// is already running (reconnect), otherwise only a status message.
    Connected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        boards: Option<Boards>,
        #[serde(default)]
        current_turn: Option<PlayerName>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
    },
    /// The host started the game; first authoritative snapshot.
    GameCreated {
        boards: Boards,
        #[serde(default)]
        current_turn: Option<PlayerName>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        players: Vec<PlayerName>,
    },
    /// A shot was resolved, by either player.
    MoveMade {
        boards: Boards,
        #[serde(default)]
        current_turn: Option<PlayerName>,
        #[serde(default)]
        winner: Option<PlayerName>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_id: Option<String>,
        /// Who fired.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by: Option<PlayerName>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        row: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        col: Option<usize>,
        /// Free-form outcome text; see [`ShotResult::parse`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
}

impl ServerEvent {
    /// The wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::GameCreated { .. } => "game_created",
            Self::MoveMade { .. } => "move_made",
        }
    }
}

/// Parse one inbound text frame.
///
/// Anything that is not a known event (invalid JSON, no `event` tag, an
/// unrecognized tag such as `ack`) is logged and dropped.
pub fn parse_server_event(text: &str) -> Option<ServerEvent> {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("discarding inbound message: {e}; raw: {text}");
            None
        }
    }
}

// ── Outbound commands ───────────────────────────────────────────────

/// Commands sent to the game service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Fire at `(row, col)` on the opponent's board.
    Move {
        player_name: PlayerName,
        row: usize,
        col: usize,
        room_id: RoomId,
    },
}

// ── Shot results ────────────────────────────────────────────────────

/// The game service's verdict on a shot, decoded from the `result` text of a
/// `move_made` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotResult {
    Hit,
    Miss,
    /// The shot finished off a ship.
    Sunk { ship: String },
    /// The square had already been fired at; the turn passes.
    AlreadyTargeted,
    /// Coordinates off the board.
    OutOfBounds,
    /// Someone fired out of turn; the board did not change.
    NotYourTurn,
    /// The game had already been decided.
    GameOver,
    /// Text this client does not recognize, kept verbatim.
    Other(String),
}

impl ShotResult {
    /// Decode a result string such as `"hit"`, `"sunk Carrier"` or
    /// `"sunk Destroyer#2 — alice wins!"`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        // A winning shot is reported as "<result> — <player> wins!".
        let shot = trimmed
            .split_once(" — ")
            .map_or(trimmed, |(shot, _)| shot.trim());

        if shot.starts_with("Game over!") {
            return Self::GameOver;
        }
        match shot {
            "hit" => Self::Hit,
            "miss" => Self::Miss,
            "already" => Self::AlreadyTargeted,
            "invalid" => Self::OutOfBounds,
            "Not your turn." => Self::NotYourTurn,
            _ => match shot.strip_prefix("sunk ") {
                Some(ship) if !ship.is_empty() => Self::Sunk {
                    ship: ship.to_string(),
                },
                _ => Self::Other(trimmed.to_string()),
            },
        }
    }
}

impl fmt::Display for ShotResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => f.write_str("hit"),
            Self::Miss => f.write_str("miss"),
            Self::Sunk { ship } => write!(f, "sunk {ship}"),
            Self::AlreadyTargeted => f.write_str("already targeted"),
            Self::OutOfBounds => f.write_str("off the board"),
            Self::NotYourTurn => f.write_str("not your turn"),
            Self::GameOver => f.write_str("game over"),
            Self::Other(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn cell_symbols() {
        for cell in [Cell::Water, Cell::Ship, Cell::Hit, Cell::Miss] {
            assert_eq!(Cell::from_symbol(cell.symbol()), cell);
        }
        assert_eq!(Cell::from_symbol("?"), Cell::Water);
    }

    #[test]
    fn board_accessors() {
        let board: Board = serde_json::from_str(r#"[["~","O"],["X","M"]]"#).unwrap();
        assert_eq!(board.size(), 2);
        assert_eq!(board.cell(0, 1), Some(Cell::Ship));
        assert_eq!(board.cell(1, 0), Some(Cell::Hit));
        assert_eq!(board.cell(2, 0), None);
        assert_eq!(board.cells().count(), 4);
    }

    #[test]
    fn kind_matches_wire_tag() {
        let event = parse_server_event(r#"{"event":"connected","message":"waiting_for_game"}"#)
            .unwrap();
        assert_eq!(event.kind(), "connected");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "connected");
    }

    #[test]
    fn shot_result_parsing() {
        assert_eq!(ShotResult::parse("hit"), ShotResult::Hit);
        assert_eq!(ShotResult::parse("miss"), ShotResult::Miss);
        assert_eq!(
            ShotResult::parse("sunk Carrier"),
            ShotResult::Sunk {
                ship: "Carrier".into()
            }
        );
        assert_eq!(
            ShotResult::parse("sunk Destroyer#2 — alice wins!"),
            ShotResult::Sunk {
                ship: "Destroyer#2".into()
            }
        );
        assert_eq!(ShotResult::parse("already"), ShotResult::AlreadyTargeted);
        assert_eq!(ShotResult::parse("invalid"), ShotResult::OutOfBounds);
        assert_eq!(ShotResult::parse("Not your turn."), ShotResult::NotYourTurn);
        assert_eq!(
            ShotResult::parse("Game over! bob already won."),
            ShotResult::GameOver
        );
        assert_eq!(
            ShotResult::parse("splash"),
            ShotResult::Other("splash".into())
        );
    }
}
