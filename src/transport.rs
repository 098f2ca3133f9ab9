//! Transport abstraction for the game-service connection.
//!
//! The game service exchanges one JSON text message per event or command, so
//! a [`Transport`] only has to move whole strings in both directions. Framing
//! is the implementation's concern.
//!
//! Connection setup is not part of the trait. Build a connected transport
//! (or a future that yields one) and hand it to
//! [`GameSession::start`](crate::session::GameSession::start) or
//! [`GameSession::start_with`](crate::session::GameSession::start_with).
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use battleship_client::error::BattleshipError;
//! use battleship_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, message: String) -> Result<(), BattleshipError> {
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, BattleshipError>> {
//!         // Return None when the connection is closed cleanly
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), BattleshipError> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::BattleshipError;

/// A bidirectional text message transport to the game service.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) **MUST** be cancel-safe: the session loop polls
/// it inside `tokio::select!`, and a cancelled `recv` must not lose a message.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send one JSON text message.
    ///
    /// # Errors
    ///
    /// Returns [`BattleshipError::TransportSend`] if the message could not be
    /// sent, or [`BattleshipError::TransportClosed`] after [`close`](Transport::close).
    async fn send(&mut self, message: String) -> Result<(), BattleshipError>;

    /// Receive the next JSON text message.
    ///
    /// Returns:
    /// - `Some(Ok(text))` — a complete message was received
    /// - `Some(Err(e))` — a transport error occurred
    /// - `None` — the connection was closed cleanly
    async fn recv(&mut self) -> Option<Result<String, BattleshipError>>;

    /// Close the connection. Must release resources even if the close
    /// handshake fails, and must be idempotent.
    async fn close(&mut self) -> Result<(), BattleshipError>;
}
