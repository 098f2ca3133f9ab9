//! HTTP clients for the user and room services.
//!
//! Both services answer errors with a JSON body `{"detail": "..."}`; that
//! text comes back as [`BattleshipError::Rejected`] so it can be shown to the
//! user unchanged.

use std::collections::HashMap;
use std::fmt;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{HttpConfig, ServiceEndpoints};
use crate::error::{BattleshipError, Result, DEFAULT_REJECTION_DETAIL};
use crate::protocol::{PlayerName, RoomId};

// ── Wire types ──────────────────────────────────────────────────────

/// Lifecycle of a room as reported by the room service.
///
/// Only `waiting` and `started` mean anything to the client; other values are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoomStatus {
    Waiting,
    Started,
    Other(String),
}

impl From<String> for RoomStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "waiting" => Self::Waiting,
            "started" => Self::Started,
            _ => Self::Other(value),
        }
    }
}

impl From<RoomStatus> for String {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Waiting => "waiting".into(),
            RoomStatus::Started => "started".into(),
            RoomStatus::Other(other) => other,
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => f.write_str("waiting"),
            Self::Started => f.write_str("started"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// One entry of `GET /list_rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub host: PlayerName,
    #[serde(default)]
    pub guest: Option<PlayerName>,
    pub status: RoomStatus,
}

#[derive(Debug, Deserialize)]
struct MessageReply {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UsersReply {
    #[serde(default)]
    registered_users: Vec<PlayerName>,
}

/// Reply to a successful `POST /start_game`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartGameReply {
    #[serde(default)]
    pub message: String,
    /// The game service's answer, passed through by the room service.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct UsernameBody<'a> {
    username: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRoomBody<'a> {
    room_id: &'a str,
    host_player: &'a str,
}

#[derive(Debug, Serialize)]
struct JoinRoomBody<'a> {
    room_id: &'a str,
    guest_player: &'a str,
}

// ── Helpers ─────────────────────────────────────────────────────────

fn build_http(config: &HttpConfig) -> Result<Client> {
    Ok(Client::builder().timeout(config.request_timeout).build()?)
}

/// Trim a username, rejecting an empty one before any request is made.
pub fn validate_username(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BattleshipError::InvalidInput("Username is required"));
    }
    Ok(trimmed)
}

fn validate_room_id(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BattleshipError::InvalidInput("Room ID is required"));
    }
    Ok(trimmed)
}

/// Decode a success body, or turn an error status into `Rejected`.
async fn read_reply<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let detail = match response.json::<ErrorReply>().await {
        Ok(ErrorReply {
            detail: Some(serde_json::Value::String(text)),
        }) => text,
        Ok(ErrorReply {
            detail: Some(other),
        }) => other.to_string(),
        _ => DEFAULT_REJECTION_DETAIL.to_string(),
    };
    debug!(status = status.as_u16(), %detail, "request rejected");
    Err(BattleshipError::Rejected {
        status: status.as_u16(),
        detail,
    })
}

// ── User service ────────────────────────────────────────────────────

/// Client for the user service (registration and login by username).
#[derive(Debug, Clone)]
pub struct UserServiceClient {
    http: Client,
    endpoints: ServiceEndpoints,
}

impl UserServiceClient {
    pub fn new(endpoints: ServiceEndpoints, config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            endpoints,
        })
    }

    /// Register a new username. Returns the service's welcome message.
    pub async fn register(&self, username: &str) -> Result<String> {
        let username = validate_username(username)?;
        self.post_username(self.endpoints.register_url()?, username)
            .await
    }

    /// Log in with an existing username.
    pub async fn login(&self, username: &str) -> Result<String> {
        let username = validate_username(username)?;
        self.post_username(self.endpoints.login_url()?, username)
            .await
    }

    /// Every registered username.
    pub async fn list_users(&self) -> Result<Vec<PlayerName>> {
        let response = self.http.get(self.endpoints.users_url()?).send().await?;
        let reply: UsersReply = read_reply(response).await?;
        Ok(reply.registered_users)
    }

    async fn post_username(&self, url: Url, username: &str) -> Result<String> {
        let response = self
            .http
            .post(url)
            .json(&UsernameBody { username })
            .send()
            .await?;
        let reply: MessageReply = read_reply(response).await?;
        Ok(reply.message)
    }
}

// ── Room service ────────────────────────────────────────────────────

/// Client for the room service (matchmaking and game start).
#[derive(Debug, Clone)]
pub struct RoomServiceClient {
    http: Client,
    endpoints: ServiceEndpoints,
}

impl RoomServiceClient {
    pub fn new(endpoints: ServiceEndpoints, config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            endpoints,
        })
    }

    /// All rooms, keyed by room id.
    pub async fn list_rooms(&self) -> Result<HashMap<RoomId, RoomInfo>> {
        let response = self
            .http
            .get(self.endpoints.list_rooms_url()?)
            .send()
            .await?;
        read_reply(response).await
    }

    /// Create `room_id` with `host` as its host.
    pub async fn create_room(&self, room_id: &str, host: &str) -> Result<String> {
        let room_id = validate_room_id(room_id)?;
        let host = validate_username(host)?;
        let response = self
            .http
            .post(self.endpoints.create_room_url()?)
            .json(&CreateRoomBody {
                room_id,
                host_player: host,
            })
            .send()
            .await?;
        let reply: MessageReply = read_reply(response).await?;
        Ok(reply.message)
    }

    /// Join `room_id` as its guest.
    pub async fn join_room(&self, room_id: &str, guest: &str) -> Result<String> {
        let room_id = validate_room_id(room_id)?;
        let guest = validate_username(guest)?;
        let response = self
            .http
            .post(self.endpoints.join_room_url()?)
            .json(&JoinRoomBody {
                room_id,
                guest_player: guest,
            })
            .send()
            .await?;
        let reply: MessageReply = read_reply(response).await?;
        Ok(reply.message)
    }

    /// Ask the room service to start the game. Only the host may.
    pub async fn start_game(&self, room_id: &str, username: &str) -> Result<StartGameReply> {
        let room_id = validate_room_id(room_id)?;
        let username = validate_username(username)?;
        let response = self
            .http
            .post(self.endpoints.start_game_url(room_id, username)?)
            .send()
            .await?;
        read_reply(response).await
    }
}
