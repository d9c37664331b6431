//! The alert engine.

use std::sync::Arc;

use reqwatch_types::{RequestBegin, RequestEnd, RequestId, ViewId};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::{CooldownGate, PendingRequest, RequestTable};
use crate::clock::{Clock, SystemClock};
use crate::filter::tracked_host;
use crate::settings::{Settings, SettingsDiff, SOUND_COOLDOWN_MS};
use crate::sink::{FocusQuery, Notification, NotificationSink, PlaybackSink};

/// What happened to the sound for one alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundOutcome {
    Played,
    /// The sink was asked to play and reported an error.
    PlaybackFailed,
    /// Another alert played a sound too recently.
    CooledDown,
    /// The sink has no sound loaded.
    NotLoaded,
    /// The engine was built without a playback sink.
    NoSink,
}

/// What happened to the OS notification for one alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    /// Shown, with this id.
    Sent(String),
    Failed,
    /// OS notifications are turned off in the settings.
    Disabled,
    /// The engine was built without a notification sink.
    NoSink,
}

/// The result of an eligible alert: a long request whose view was not
/// focused when it finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDecision {
    pub request_id: RequestId,
    pub view_id: ViewId,
    pub url: String,
    pub hostname: String,
    pub duration_secs: f64,
    pub sound: SoundOutcome,
    pub notification: NotificationOutcome,
}

/// Running totals kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Begin events admitted into the table.
    pub tracked: u64,
    /// Begin events rejected by kind, view or domain filter.
    pub ignored: u64,
    /// End events with no pending begin.
    pub unmatched_ends: u64,
    /// Requests that finished under the threshold.
    pub short: u64,
    /// Long requests whose view was focused.
    pub focused: u64,
    /// Eligible alerts.
    pub alerted: u64,
    pub sounds_played: u64,
    pub sounds_cooled_down: u64,
    pub notifications_sent: u64,
    /// Playback or notification failures.
    pub dispatch_failures: u64,
}

/// Correlates begin and end events and decides when to alert.
///
/// The engine is driven from a single task; every mutating operation takes
/// `&mut self`. Settings are an immutable snapshot that is replaced whole by
/// [`apply_settings`](Self::apply_settings).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use reqwatch::{AlertEngine, ManualClock, MemoryPlayback, ViewRegistry};
/// use reqwatch_types::{RequestBegin, RequestEnd, RequestKind, ViewId};
///
/// # tokio_test::block_on(async {
/// let views = ViewRegistry::new();
/// let playback = Arc::new(MemoryPlayback::new());
/// let mut engine = AlertEngine::builder(Arc::new(views.clone()))
///     .clock(Arc::new(ManualClock::starting_at(1_000_000)))
///     .playback(playback.clone())
///     .build();
///
/// views.set(ViewId(5), false, true);
/// engine.on_request_begin(
///     RequestBegin::new("1", "https://slow.example.com/x", ViewId(5), RequestKind::Fetch).at(0.0),
/// );
/// let decision = engine.on_request_end(RequestEnd::new("1").at(12_000.0)).await;
///
/// assert!(decision.is_some());
/// assert_eq!(playback.plays(), 1);
/// # });
/// ```
#[derive(Debug)]
pub struct AlertEngine {
    table: RequestTable,
    settings: Arc<Settings>,
    cooldown: CooldownGate,
    clock: Arc<dyn Clock>,
    focus: Arc<dyn FocusQuery>,
    playback: Option<Arc<dyn PlaybackSink>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    stats: EngineStats,
}

impl AlertEngine {
    /// Start building an engine around a focus query.
    pub fn builder(focus: Arc<dyn FocusQuery>) -> AlertEngineBuilder {
        AlertEngineBuilder::new(focus)
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Number of requests that have begun and not ended.
    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.table.contains(id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingRequest> {
        self.table.iter()
    }

    pub fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    /// Handle a request-begin event. Returns true if the request is now
    /// being timed.
    pub fn on_request_begin(&mut self, begin: RequestBegin) -> bool {
        if !begin.kind.is_trackable() {
            trace!(request_id = %begin.request_id, kind = ?begin.kind, "Ignoring request kind");
            self.stats.ignored += 1;
            return false;
        }
        if !begin.view_id.is_some() {
            trace!(request_id = %begin.request_id, "Ignoring request without a view");
            self.stats.ignored += 1;
            return false;
        }
        let Some(host) = tracked_host(&begin.url, &self.settings.filter) else {
            trace!(request_id = %begin.request_id, url = %begin.url, "Request filtered out");
            self.stats.ignored += 1;
            return false;
        };

        let request = PendingRequest {
            request_id: begin.request_id,
            view_id: begin.view_id,
            url: begin.url,
            host,
            start_ms: begin.timestamp_ms,
            arrived_ms: self.clock.monotonic_ms(),
        };

        trace!(
            request_id = %request.request_id,
            view_id = %request.view_id,
            host = %request.host,
            "Tracking request"
        );
        if let Some(stale) = self.table.insert(request) {
            debug!(request_id = %stale.request_id, "Replaced stale pending request");
        }
        self.stats.tracked += 1;
        true
    }

    /// Handle a request-end event.
    ///
    /// Returns the alert decision if the request was long and its view was
    /// not focused. Sound and notification failures are logged and recorded
    /// in the decision; they never put the request back.
    pub async fn on_request_end(&mut self, end: RequestEnd) -> Option<AlertDecision> {
        let Some(request) = self.table.take(&end.request_id) else {
            trace!(request_id = %end.request_id, "End without a pending begin");
            self.stats.unmatched_ends += 1;
            return None;
        };

        let duration_secs = request.duration_secs(end.timestamp_ms, self.clock.monotonic_ms());

        // A decision keeps the snapshot it started with.
        let settings = Arc::clone(&self.settings);

        if duration_secs < settings.alert.threshold_secs {
            trace!(request_id = %request.request_id, duration_secs, "Request finished in time");
            self.stats.short += 1;
            return None;
        }

        let focused = match self.focus.is_focused(request.view_id).await {
            Ok(focused) => focused,
            Err(e) => {
                debug!(view_id = %request.view_id, error = %e, "Focus unknown, treating as unfocused");
                false
            }
        };
        if focused {
            debug!(
                request_id = %request.request_id,
                host = %request.host,
                duration_secs,
                "Long request in focused view"
            );
            self.stats.focused += 1;
            return None;
        }

        self.stats.alerted += 1;
        info!(
            request_id = %request.request_id,
            view_id = %request.view_id,
            host = %request.host,
            duration_secs,
            reason = ?end.reason,
            "Long request finished"
        );

        let now = self.clock.wall_ms();
        let sound = self.dispatch_sound(now).await;
        let notification = self
            .dispatch_notification(&request, duration_secs, now, &settings)
            .await;

        Some(AlertDecision {
            request_id: request.request_id,
            view_id: request.view_id,
            url: request.url,
            hostname: request.host,
            duration_secs,
            sound,
            notification,
        })
    }

    async fn dispatch_sound(&mut self, now: u64) -> SoundOutcome {
        let Some(playback) = &self.playback else {
            return SoundOutcome::NoSink;
        };
        if !playback.is_loaded() {
            warn!("No alert sound loaded");
            return SoundOutcome::NotLoaded;
        }

        if !self.cooldown.try_fire(now) {
            debug!(
                last_fired = ?self.cooldown.last_fired(),
                cooldown_ms = self.cooldown.cooldown_ms(),
                "Alert sound cooling down"
            );
            self.stats.sounds_cooled_down += 1;
            return SoundOutcome::CooledDown;
        }

        match playback.play().await {
            Ok(()) => {
                self.stats.sounds_played += 1;
                SoundOutcome::Played
            }
            Err(e) => {
                warn!(error = %e, "Failed to play alert sound");
                self.stats.dispatch_failures += 1;
                SoundOutcome::PlaybackFailed
            }
        }
    }

    async fn dispatch_notification(
        &mut self,
        request: &PendingRequest,
        duration_secs: f64,
        now: u64,
        settings: &Settings,
    ) -> NotificationOutcome {
        if !settings.alert.os_notifications {
            return NotificationOutcome::Disabled;
        }
        let Some(notifications) = &self.notifications else {
            return NotificationOutcome::NoSink;
        };

        let notification =
            Notification::long_request(&request.request_id, &request.host, duration_secs, now);
        match notifications.notify(&notification).await {
            Ok(()) => {
                self.stats.notifications_sent += 1;
                NotificationOutcome::Sent(notification.id)
            }
            Err(e) => {
                warn!(id = %notification.id, error = %e, "Failed to show notification");
                self.stats.dispatch_failures += 1;
                NotificationOutcome::Failed
            }
        }
    }

    /// Replace the settings snapshot.
    ///
    /// Requests already pending stay pending under the new filter. The
    /// playback sink reloads its sound only when the sound settings changed.
    pub fn apply_settings(&mut self, settings: Settings) -> SettingsDiff {
        let diff = SettingsDiff::between(&self.settings, &settings);
        if diff.is_empty() {
            debug!("Settings unchanged");
            return diff;
        }

        self.settings = Arc::new(settings);
        if diff.sound {
            self.reload_sound();
        }

        info!(
            filter = diff.filter,
            alert = diff.alert,
            sound = diff.sound,
            threshold_secs = self.settings.alert.threshold_secs,
            mode = self.settings.filter.mode.as_str(),
            "Settings applied"
        );
        diff
    }

    fn reload_sound(&self) {
        if let Some(playback) = &self.playback {
            if let Err(e) = playback.load(&self.settings.sound) {
                warn!(error = %e, "Failed to load alert sound");
            }
        }
    }

    /// Play the configured sound now, ignoring threshold, focus and
    /// cooldown. Does not count as an alert.
    pub async fn play_test_sound(&self) -> SoundOutcome {
        let Some(playback) = &self.playback else {
            warn!("Test sound requested, but playback is disabled");
            return SoundOutcome::NoSink;
        };
        if !playback.is_loaded() {
            warn!("Test sound requested, but no sound is loaded");
            return SoundOutcome::NotLoaded;
        }

        match playback.play().await {
            Ok(()) => SoundOutcome::Played,
            Err(e) => {
                warn!(error = %e, "Failed to play test sound");
                SoundOutcome::PlaybackFailed
            }
        }
    }
}

/// Builder for [`AlertEngine`].
#[derive(Debug)]
pub struct AlertEngineBuilder {
    focus: Arc<dyn FocusQuery>,
    clock: Option<Arc<dyn Clock>>,
    playback: Option<Arc<dyn PlaybackSink>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    settings: Settings,
}

impl AlertEngineBuilder {
    pub fn new(focus: Arc<dyn FocusQuery>) -> Self {
        Self {
            focus,
            clock: None,
            playback: None,
            notifications: None,
            settings: Settings::default(),
        }
    }

    /// Time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Where alert sounds go. Without one the engine never makes a sound.
    pub fn playback(mut self, playback: Arc<dyn PlaybackSink>) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Where OS notifications go.
    pub fn notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Initial settings. Defaults to [`Settings::default`].
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Build the engine and load the initial sound into the playback sink.
    pub fn build(self) -> AlertEngine {
        let engine = AlertEngine {
            table: RequestTable::new(),
            settings: Arc::new(self.settings),
            cooldown: CooldownGate::new(SOUND_COOLDOWN_MS),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            focus: self.focus,
            playback: self.playback,
            notifications: self.notifications,
            stats: EngineStats::default(),
        };
        engine.reload_sound();
        engine
    }
}
