//! Error types for the Battleship client.

use thiserror::Error;

/// Fallback message when a service rejects a request without a `detail`.
pub const DEFAULT_REJECTION_DETAIL: &str = "Request failed";

/// Errors that can occur when using the Battleship client.
#[derive(Debug, Error)]
pub enum BattleshipError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed unexpectedly.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize or deserialize a message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An HTTP request to the user or room service failed before a response arrived.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A service answered with a non-success status.
    ///
    /// `detail` is the service's own message and is meant to be shown to the
    /// user verbatim.
    #[error("{detail}")]
    Rejected {
        /// HTTP status code of the response.
        status: u16,
        /// Human-readable reason returned by the service.
        detail: String,
    },

    /// Local input was rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The action requires a logged-in user.
    #[error("not logged in")]
    NotLoggedIn,

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BattleshipError {
    /// The message to show a user for this error.
    ///
    /// Service rejections and local input errors surface their text
    /// unchanged; everything else uses the error's display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { detail, .. } => detail.clone(),
            Self::InvalidInput(reason) => (*reason).to_string(),
            other => other.to_string(),
        }
    }
}

/// A specialized [`Result`] type for Battleship client operations.
pub type Result<T> = std::result::Result<T, BattleshipError>;
