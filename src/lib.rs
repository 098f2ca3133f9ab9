//! # Battleship Client
//!
//! Async client core for a two-player Battleship game played against three
//! HTTP/WebSocket services: users, rooms and the game itself.
//!
//! The crate holds the behavior behind a game UI, without the UI:
//!
//! - [`GameSession`]: one WebSocket connection per `(room, player)`, a local
//!   [`SessionState`] mirror of the game, and a move command that is only
//!   sent while connected
//! - [`board_view`]: fog-of-war rendering of the opponent's board
//! - [`RoomPoller`]: watches a room until its game starts
//! - [`GameScreen`]: turn-gated clicks and the timed return to the lobby
//! - [`UserServiceClient`] / [`RoomServiceClient`]: the HTTP side
//!
//! The game service is authoritative. The client never patches a board
//! locally: every snapshot it receives replaces the previous one.
//!
//! ## Features
//!
//! - **Transport-agnostic**: implement the [`Transport`] trait for any backend
//! - **WebSocket built-in**: the default `transport-websocket` feature provides
//!   `WebSocketTransport` and [`GameSession::open`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use battleship_client::*;
//!
//! let endpoints = ServiceEndpoints::from_env();
//! let identity = SessionIdentity::new("R1", "alice");
//! let (session, mut events) = GameSession::open(&endpoints, identity, SessionConfig::default());
//!
//! let (nav_tx, mut routes) = tokio::sync::mpsc::unbounded_channel();
//! let screen = GameScreen::mount(session, Arc::new(nav_tx), ScreenConfig::default());
//!
//! while let Some(event) = events.recv().await {
//!     println!("{}", screen.view().status_line());
//!     if let SessionEvent::Disconnected { .. } = event {
//!         break;
//!     }
//! }
//! ```

pub mod api;
pub mod board_view;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod game_screen;
pub mod navigation;
pub mod protocol;
pub mod room_poller;
pub mod session;
pub mod transport;
pub mod transports;

// Re-export primary types for ergonomic imports.
pub use api::{RoomInfo, RoomServiceClient, RoomStatus, UserServiceClient};
pub use board_view::{render, CellClass, DisplayGrid, BOARD_SIZE};
pub use config::{HttpConfig, ScreenConfig, ServiceEndpoints, SessionConfig};
pub use context::SessionContext;
pub use error::{BattleshipError, Result};
pub use event::SessionEvent;
pub use game_screen::{GameScreen, GameView};
pub use navigation::{Navigator, RecordingNavigator, Route};
pub use protocol::{Board, Boards, Cell, ClientCommand, ServerEvent, ShotResult};
pub use room_poller::{RoomDirectory, RoomObservation, RoomPoller, RoomSummary, RoomTracker};
pub use session::{ConnectionStatus, GameSession, SessionIdentity, SessionState};
pub use transport::Transport;

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
