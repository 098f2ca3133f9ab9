//! Screens the client can move between.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::RoomId;

/// A destination screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Lobby,
    Room(RoomId),
    Game(RoomId),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("/login"),
            Self::Lobby => f.write_str("/lobby"),
            Self::Room(id) => write!(f, "/room/{id}"),
            Self::Game(id) => write!(f, "/game/{id}"),
        }
    }
}

/// Something that can switch the visible screen.
///
/// Called from background tasks, so implementations must not block.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: Route);
}

/// Forwards routes to a channel; the receiving side drives the UI.
impl Navigator for mpsc::UnboundedSender<Route> {
    fn navigate(&self, route: Route) {
        debug!(%route, "navigate");
        if self.send(route).is_err() {
            debug!("navigation receiver dropped");
        }
    }
}

/// Keeps every requested route, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes requested so far.
    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .map(|routes| routes.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        debug!(%route, "navigate");
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(route);
        }
    }
}
