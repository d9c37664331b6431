//! Collaborators the alert engine talks to.
//!
//! The engine never touches the OS directly. It asks a [`FocusQuery`]
//! whether a view is being looked at, plays sound through a
//! [`PlaybackSink`] and shows notifications through a
//! [`NotificationSink`]. Every call may fail; the engine logs failures and
//! carries on.

mod bell;
mod command;
mod log;
mod memory;

pub use bell::BellPlayback;
pub use command::{CommandNotifier, CommandPlayback};
pub use log::LogNotifier;
pub use memory::{MemoryNotifier, MemoryPlayback};

use std::fmt::Debug;

use async_trait::async_trait;
use reqwatch_types::{RequestId, ViewId};
use serde::Serialize;

use crate::error::{FocusError, SinkError};
use crate::settings::SoundSettings;

/// Title shown on every long-request notification.
pub const NOTIFICATION_TITLE: &str = "Long request finished";

/// Answers whether a view currently has the user's attention.
#[async_trait]
pub trait FocusQuery: Send + Sync + Debug {
    /// Returns `Ok(true)` if the view is the active view of a window that has
    /// input focus. A view that no longer exists is an error.
    async fn is_focused(&self, view: ViewId) -> Result<bool, FocusError>;
}

/// Plays the alert sound.
#[async_trait]
pub trait PlaybackSink: Send + Sync + Debug {
    /// Load the configured sound and volume, replacing whatever was loaded.
    fn load(&self, sound: &SoundSettings) -> Result<(), SinkError>;

    /// Whether a sound is ready to play.
    fn is_loaded(&self) -> bool;

    /// Play the loaded sound once.
    async fn play(&self) -> Result<(), SinkError>;
}

/// Shows OS-level notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync + Debug {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// A notification about a long request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Unique per alert.
    pub id: String,
    pub title: String,
    pub body: String,
    pub hostname: String,
    pub duration_secs: f64,
}

impl Notification {
    /// Build the notification for a request that took `duration_secs`.
    ///
    /// `wall_ms` is the current wall-clock time and makes the id unique even
    /// when a request id is reused.
    pub fn long_request(
        request_id: &RequestId,
        hostname: &str,
        duration_secs: f64,
        wall_ms: u64,
    ) -> Self {
        Self {
            id: format!("long-request-{}-{}", request_id, wall_ms),
            title: NOTIFICATION_TITLE.to_string(),
            body: format!("Request to {} took {:.2} seconds", hostname, duration_secs),
            hostname: hostname.to_string(),
            duration_secs,
        }
    }
}
