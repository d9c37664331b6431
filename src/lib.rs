//! # reqwatch
//!
//! Times in-flight requests and raises a throttled alert, as a sound and
//! optionally an OS notification, when a request takes longer than a
//! threshold while the view that issued it is not being looked at.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Monitor                              │
//! │  ┌──────────┐   begin/end   ┌─────────────┐   ┌───────────────┐  │
//! │  │  source  │──────────────▶│ AlertEngine │──▶│ PlaybackSink  │  │
//! │  │ (events) │               │  (tracker)  │──▶│ Notification- │  │
//! │  └────┬─────┘               └──────┬──────┘   │ Sink          │  │
//! │       │ focus                      │ focus?   └───────────────┘  │
//! │       ▼                            ▼                             │
//! │  ┌──────────────┐◀─────────────────┘                             │
//! │  │ ViewRegistry │                                                │
//! │  └──────────────┘      settings ──▶ apply_settings()             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`filter`]**: decides from the URL's host whether a request is timed
//! - **[`tracker`]**: the pending-request table and the [`AlertEngine`]
//!   (threshold, focus check, sound cooldown, dispatch)
//! - **[`settings`]**: layered settings loading, change application and
//!   file watching
//! - **[`source`]**: [`EventSource`] implementations for files, byte
//!   streams and channels
//! - **[`sink`]**: focus, playback and notification collaborators
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Read events from stdin
//! browser-bridge | reqwatch --settings ~/.config/reqwatch.toml
//!
//! # Replay a recorded event file
//! reqwatch --events session.ndjson --sound none
//!
//! # Connect to a TCP endpoint that streams events
//! reqwatch --connect localhost:9091 --notify-command notify-send {title} {body}
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use reqwatch::{AlertEngine, ChannelSource, MemoryPlayback, Monitor, Settings, ViewRegistry};
//! use reqwatch_types::{Event, RequestBegin, RequestEnd, RequestKind, ViewId};
//!
//! # tokio_test::block_on(async {
//! let views = ViewRegistry::new();
//! let playback = Arc::new(MemoryPlayback::new());
//! let engine = AlertEngine::builder(Arc::new(views.clone()))
//!     .playback(playback.clone())
//!     .settings(Settings::default())
//!     .build();
//! let mut monitor = Monitor::new(engine, views);
//!
//! let (tx, mut source) = ChannelSource::create("example");
//! tx.send(Event::RequestBegin(
//!     RequestBegin::new("1", "https://api.example.com/report", ViewId(2), RequestKind::Fetch).at(0.0),
//! ))
//! .await
//! .unwrap();
//! tx.send(Event::RequestEnd(RequestEnd::new("1").at(11_000.0))).await.unwrap();
//! drop(tx);
//!
//! let stats = monitor.run(&mut source, None).await;
//! assert_eq!(stats.alerted, 1);
//! assert_eq!(playback.plays(), 1);
//! # });
//! ```

pub mod clock;
pub mod duration;
pub mod error;
pub mod filter;
pub mod focus;
pub mod monitor;
pub mod settings;
pub mod sink;
pub mod source;
pub mod tracker;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, FocusError, Result, SinkError};
pub use filter::{matches, should_track, FilterConfig, FilterMode};
pub use focus::ViewRegistry;
pub use monitor::Monitor;
pub use settings::{
    AlertConfig, Settings, SettingsDiff, SettingsLoader, SettingsWatcher, SoundSettings,
    SoundSource,
};
pub use sink::{
    BellPlayback, CommandNotifier, CommandPlayback, FocusQuery, LogNotifier, MemoryNotifier,
    MemoryPlayback, Notification, NotificationSink, PlaybackSink,
};
pub use source::{ChannelSource, EventSource, FileSource, StreamSource};
pub use tracker::{
    AlertDecision, AlertEngine, AlertEngineBuilder, CooldownGate, EngineStats,
    NotificationOutcome, PendingRequest, SoundOutcome,
};
