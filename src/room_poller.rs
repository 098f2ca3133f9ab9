//! Watches a room until its game starts.
//!
//! [`RoomPoller`] asks a [`RoomDirectory`] for one room on a fixed interval
//! and publishes what it saw. When the room reaches
//! [`RoomStatus::Started`] the poller fires its transition signal exactly
//! once, so the caller can open the game screen. The diffing lives in
//! [`RoomTracker`], which knows nothing about timers or HTTP.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::{RoomInfo, RoomServiceClient, RoomStatus};
use crate::error::Result;
use crate::protocol::{PlayerName, RoomId};

/// A room as seen by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub host: PlayerName,
    pub guest: Option<PlayerName>,
    pub status: RoomStatus,
}

impl RoomSummary {
    pub fn from_info(room_id: impl Into<RoomId>, info: RoomInfo) -> Self {
        Self {
            room_id: room_id.into(),
            host: info.host,
            guest: info.guest,
            status: info.status,
        }
    }

    pub fn is_started(&self) -> bool {
        self.status == RoomStatus::Started
    }

    /// `true` if `player` is the host (only the host may start the game).
    pub fn is_host(&self, player: &str) -> bool {
        self.host == player
    }
}

/// Source of room snapshots.
#[async_trait]
pub trait RoomDirectory: Send + Sync + 'static {
    /// Look up one room. `Ok(None)` means the room does not exist.
    async fn room(&self, room_id: &str) -> Result<Option<RoomSummary>>;
}

#[async_trait]
impl RoomDirectory for RoomServiceClient {
    async fn room(&self, room_id: &str) -> Result<Option<RoomSummary>> {
        let mut rooms = self.list_rooms().await?;
        Ok(rooms
            .remove(room_id)
            .map(|info| RoomSummary::from_info(room_id, info)))
    }
}

/// The latest successful observation of a room.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoomObservation {
    /// No poll has succeeded yet.
    #[default]
    Pending,
    Found(RoomSummary),
    /// The directory does not list the room.
    NotFound,
}

impl RoomObservation {
    pub fn summary(&self) -> Option<&RoomSummary> {
        match self {
            Self::Found(summary) => Some(summary),
            Self::Pending | Self::NotFound => None,
        }
    }
}

/// Turns a sequence of observations into a single "started" transition.
#[derive(Debug, Default)]
pub struct RoomTracker {
    last_status: Option<RoomStatus>,
    fired: bool,
}

impl RoomTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Returns `true` the first time the room is
    /// seen started, including when the very first observation is already
    /// started; `false` forever after.
    pub fn observe(&mut self, room: Option<&RoomSummary>) -> bool {
        let Some(room) = room else {
            return false;
        };
        if self.last_status.as_ref() != Some(&room.status) {
            debug!(room = %room.room_id, status = %room.status, "room status changed");
            self.last_status = Some(room.status.clone());
        }
        if room.is_started() && !self.fired {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Shortest interval [`RoomPoller::spawn`] will poll at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a background poll of one room.
///
/// Dropping the handle stops polling; a response still in flight is
/// discarded.
pub struct RoomPoller {
    room_id: RoomId,
    observation: watch::Receiver<RoomObservation>,
    task: Option<JoinHandle<()>>,
}

impl RoomPoller {
    /// Start polling `room_id` every `interval`, the first poll immediately.
    /// Intervals shorter than [`MIN_POLL_INTERVAL`] are raised to it.
    ///
    /// Returns the handle and a receiver that resolves with the room once it
    /// has started. If polling stops first, the receiver yields an error.
    pub fn spawn<D: RoomDirectory>(
        directory: D,
        room_id: impl Into<RoomId>,
        interval: Duration,
    ) -> (Self, oneshot::Receiver<RoomSummary>) {
        let room_id = room_id.into();
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (observation_tx, observation_rx) = watch::channel(RoomObservation::Pending);
        let (started_tx, started_rx) = oneshot::channel();

        let task = tokio::spawn(poll_loop(
            directory,
            room_id.clone(),
            interval,
            observation_tx,
            started_tx,
        ));

        let poller = Self {
            room_id,
            observation: observation_rx,
            task: Some(task),
        };
        (poller, started_rx)
    }

    /// The latest observation.
    pub fn observation(&self) -> RoomObservation {
        self.observation.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RoomObservation> {
        self.observation.clone()
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Stop polling.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            debug!(room = %self.room_id, "room poller stopped");
            task.abort();
        }
    }
}

impl std::fmt::Debug for RoomPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomPoller")
            .field("room_id", &self.room_id)
            .field("running", &self.task.is_some())
            .finish()
    }
}

impl Drop for RoomPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn poll_loop<D: RoomDirectory>(
    directory: D,
    room_id: RoomId,
    interval: Duration,
    observation_tx: watch::Sender<RoomObservation>,
    started_tx: oneshot::Sender<RoomSummary>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tracker = RoomTracker::new();
    let mut started_tx = Some(started_tx);

    loop {
        ticker.tick().await;

        let found = match directory.room(&room_id).await {
            Ok(found) => found,
            Err(e) => {
                debug!(room = %room_id, error = %e, "room poll failed, keeping last observation");
                continue;
            }
        };

        if tracker.observe(found.as_ref()) {
            if let (Some(tx), Some(summary)) = (started_tx.take(), found.clone()) {
                info!(room = %room_id, "game started");
                let _ = tx.send(summary);
            }
        }

        let observation = match found {
            Some(summary) => RoomObservation::Found(summary),
            None => RoomObservation::NotFound,
        };
        observation_tx.send_replace(observation);
    }
}
