//! Terminal bell playback.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, trace};

use super::PlaybackSink;
use crate::error::SinkError;
use crate::settings::{SoundSettings, SoundSource};

const BELL: &[u8] = b"\x07";

/// Rings the terminal bell on stderr.
///
/// There is no way to play a custom sound or set a volume on a terminal
/// bell, so a custom sound rings the bell as well and any volume above zero
/// rings at full volume. A volume of zero keeps it silent.
#[derive(Debug, Default)]
pub struct BellPlayback {
    /// Volume bits (`f32::to_bits`), set by `load`.
    volume: AtomicU32,
    loaded: AtomicBool,
    rings: AtomicUsize,
}

impl BellPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the bell actually rang.
    pub fn rings(&self) -> usize {
        self.rings.load(Ordering::Relaxed)
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }
}

#[async_trait]
impl PlaybackSink for BellPlayback {
    fn load(&self, sound: &SoundSettings) -> Result<(), SinkError> {
        if let SoundSource::Custom { location, .. } = sound.source() {
            debug!(location = %location, "Custom sounds are played as a terminal bell");
        }
        self.volume.store(sound.volume.to_bits(), Ordering::Relaxed);
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    async fn play(&self) -> Result<(), SinkError> {
        if !self.is_loaded() {
            return Err(SinkError::NoSound);
        }
        if self.volume() <= 0.0 {
            trace!("Bell muted");
            return Ok(());
        }

        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(BELL)
            .and_then(|_| stderr.flush())
            .map_err(|e| SinkError::Playback(e.to_string()))?;
        self.rings.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
