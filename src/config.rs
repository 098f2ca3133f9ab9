//! Service endpoints and client tuning knobs.
//!
//! Defaults match a local deployment of the three services (user on 8001,
//! game on 8002, room on 8003). Each base URL can be overridden through the
//! environment:
//!
//! | Variable               | Default                  |
//! |------------------------|--------------------------|
//! | `BATTLESHIP_USER_URL`  | `http://127.0.0.1:8001`  |
//! | `BATTLESHIP_ROOM_URL`  | `http://127.0.0.1:8003`  |
//! | `BATTLESHIP_GAME_URL`  | `ws://127.0.0.1:8002`    |

use std::time::Duration;

use reqwest::Url;

use crate::error::{BattleshipError, Result};

/// Default user service base URL.
pub const DEFAULT_USER_URL: &str = "http://127.0.0.1:8001";
/// Default room service base URL.
pub const DEFAULT_ROOM_URL: &str = "http://127.0.0.1:8003";
/// Default game service WebSocket base URL.
pub const DEFAULT_GAME_URL: &str = "ws://127.0.0.1:8002";

/// How often the room poller asks the room service for status.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Delay between a winner being declared and the return to the lobby.
pub const WIN_REDIRECT_DELAY: Duration = Duration::from_secs(4);

const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Base URLs of the user, room and game services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub user: String,
    pub room: String,
    pub game: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER_URL.to_string(),
            room: DEFAULT_ROOM_URL.to_string(),
            game: DEFAULT_GAME_URL.to_string(),
        }
    }
}

impl ServiceEndpoints {
    /// Build endpoints from `BATTLESHIP_*_URL`, falling back to the defaults.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            user: var("BATTLESHIP_USER_URL", DEFAULT_USER_URL),
            room: var("BATTLESHIP_ROOM_URL", DEFAULT_ROOM_URL),
            game: var("BATTLESHIP_GAME_URL", DEFAULT_GAME_URL),
        }
    }

    /// `POST` target for registering a username.
    pub fn register_url(&self) -> Result<Url> {
        join(&self.user, &["register"])
    }

    /// `POST` target for logging in.
    pub fn login_url(&self) -> Result<Url> {
        join(&self.user, &["login"])
    }

    /// `GET` target listing registered users.
    pub fn users_url(&self) -> Result<Url> {
        join(&self.user, &["users"])
    }

    /// `GET` target listing every room.
    pub fn list_rooms_url(&self) -> Result<Url> {
        join(&self.room, &["list_rooms"])
    }

    pub fn create_room_url(&self) -> Result<Url> {
        join(&self.room, &["create_room"])
    }

    pub fn join_room_url(&self) -> Result<Url> {
        join(&self.room, &["join_room"])
    }

    /// `POST /start_game/{room}?username={player}`.
    pub fn start_game_url(&self, room_id: &str, username: &str) -> Result<Url> {
        let mut url = join(&self.room, &["start_game", room_id])?;
        url.query_pairs_mut().append_pair("username", username);
        Ok(url)
    }

    /// WebSocket endpoint for one player in one room: `/ws/{room}?player={player}`.
    pub fn game_socket_url(&self, room_id: &str, player: &str) -> Result<Url> {
        let mut url = join(&self.game, &["ws", room_id])?;
        url.query_pairs_mut().append_pair("player", player);
        Ok(url)
    }
}

/// Append percent-encoded path segments to a base URL.
fn join(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| {
        BattleshipError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;
    url.path_segments_mut()
        .map_err(|()| BattleshipError::InvalidInput("service URL cannot be a base"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// ── SessionConfig ───────────────────────────────────────────────────

/// Configuration for a [`GameSession`](crate::session::GameSession).
///
/// # Example
///
/// ```
/// use battleship_client::config::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.event_channel_capacity, 512);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer falls behind, events are dropped with a warning so
    /// the transport loop never blocks. `Disconnected` is always delivered.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// How long [`GameSession::shutdown`](crate::session::GameSession::shutdown)
    /// waits for the transport to close before aborting the loop.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Configuration for a [`GameScreen`](crate::game_screen::GameScreen).
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Delay before returning to the lobby once a winner is known.
    pub win_redirect_delay: Duration,
    /// Configuration for sessions opened by the screen.
    pub session: SessionConfig,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            win_redirect_delay: WIN_REDIRECT_DELAY,
            session: SessionConfig::default(),
        }
    }
}

impl ScreenConfig {
    #[must_use]
    pub fn with_win_redirect_delay(mut self, delay: Duration) -> Self {
        self.win_redirect_delay = delay;
        self
    }
}

/// Configuration for the HTTP service clients.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
