//! In-memory sinks that record what they were asked to do.
//!
//! Used to embed the engine without any OS integration, and in tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Notification, NotificationSink, PlaybackSink};
use crate::error::SinkError;
use crate::settings::SoundSettings;

/// Counts plays instead of making noise.
#[derive(Debug, Default)]
pub struct MemoryPlayback {
    loaded: Mutex<Option<SoundSettings>>,
    loads: AtomicUsize,
    plays: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful plays.
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    /// Number of times a sound was loaded.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// The most recently loaded sound.
    pub fn loaded(&self) -> Option<SoundSettings> {
        self.loaded.lock().clone()
    }

    /// Make every subsequent `play` fail.
    pub fn fail_playback(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlaybackSink for MemoryPlayback {
    fn load(&self, sound: &SoundSettings) -> Result<(), SinkError> {
        *self.loaded.lock() = Some(sound.clone());
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.lock().is_some()
    }

    async fn play(&self) -> Result<(), SinkError> {
        if !self.is_loaded() {
            return Err(SinkError::NoSound);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Playback("playback disabled".to_string()));
        }
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Keeps every notification it is given.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Make every subsequent `notify` fail.
    pub fn fail_notifications(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Notification("notifications disabled".to_string()));
        }
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}
