//! Error types.
//!
//! Nothing in the alert path surfaces these to the event producer. They exist
//! so that loaders and sinks can report what went wrong and the engine can log
//! it before falling back.

use reqwatch_types::ViewId;
use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings source could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    /// A setting was present but out of range.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// A duration string could not be parsed.
    #[error("unknown duration format: {0}")]
    Duration(String),
}

/// Errors raised by playback and notification sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// No sound has been loaded into the playback sink.
    #[error("no sound source loaded")]
    NoSound,

    /// Sound playback failed (missing player, decode error, ...).
    #[error("sound playback failed: {0}")]
    Playback(String),

    /// The notification could not be shown.
    #[error("notification failed: {0}")]
    Notification(String),

    /// Spawning an external helper failed.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a focus query.
#[derive(Debug, Error)]
pub enum FocusError {
    /// The view was closed or never existed.
    #[error("view {0} is unknown")]
    UnknownView(ViewId),

    /// The focus provider itself failed.
    #[error("focus query failed: {0}")]
    Unavailable(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
