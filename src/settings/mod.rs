//! User settings.
//!
//! Settings are loaded from an optional file layered with `REQWATCH_*`
//! environment variables, validated, and turned into an immutable
//! [`Settings`] snapshot. A snapshot is never edited in place: changes
//! produce a new snapshot which replaces the old one wholesale, and
//! [`SettingsDiff`] tells the consumer which dependent state needs
//! refreshing.
//!
//! ## Data Flow
//!
//! ```text
//! settings file + env ──▶ StoredSettings ──▶ Settings::from_stored() ──▶ Settings
//!                                                                          │
//! change notification (key -> value) ──▶ Settings::apply_changes() ───────┤
//!                                                                          ▼
//!                                                       AlertEngine::apply_settings()
//! ```

mod stored;
mod watcher;

pub use stored::{parse_domain_list, StoredSettings};
pub use watcher::SettingsWatcher;

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::{is_valid_pattern, FilterConfig, FilterMode};

/// Default long-request threshold in seconds.
pub const DEFAULT_THRESHOLD_SECS: f64 = 10.0;

/// Largest accepted long-request threshold (one day).
pub const MAX_THRESHOLD_SECS: f64 = 86_400.0;

/// Default playback volume.
pub const DEFAULT_VOLUME: f32 = 0.7;

/// Minimum wall-clock gap between two audible alerts.
pub const SOUND_COOLDOWN_MS: u64 = 3_000;

/// Prefix for environment variable overrides (`REQWATCH_LONG_REQUEST_THRESHOLD`, ...).
pub const ENV_PREFIX: &str = "REQWATCH";

/// Alert rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertConfig {
    /// Requests lasting at least this long are eligible for an alert.
    pub threshold_secs: f64,
    /// Show an OS notification for every eligible alert.
    pub os_notifications: bool,
}

impl AlertConfig {
    /// Cooldown between audible alerts. Not user-configurable.
    pub const fn cooldown_ms(&self) -> u64 {
        SOUND_COOLDOWN_MS
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold_secs: DEFAULT_THRESHOLD_SECS,
            os_notifications: false,
        }
    }
}

/// Sound selection and volume.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSettings {
    /// Playback volume in `[0, 1]`.
    pub volume: f32,
    /// Path or data URL of a user-supplied sound.
    pub custom_location: Option<String>,
    /// Display name of the user-supplied sound.
    pub custom_name: Option<String>,
}

/// Which sound the playback sink should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// The sound shipped with the player.
    Bundled,
    /// A user-supplied sound.
    Custom {
        location: String,
        name: Option<String>,
    },
}

impl SoundSettings {
    pub fn source(&self) -> SoundSource {
        match &self.custom_location {
            Some(location) => SoundSource::Custom {
                location: location.clone(),
                name: self.custom_name.clone(),
            },
            None => SoundSource::Bundled,
        }
    }
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            custom_location: None,
            custom_name: None,
        }
    }
}

/// A complete, validated settings snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub filter: FilterConfig,
    pub alert: AlertConfig,
    pub sound: SoundSettings,
}

impl Settings {
    /// Validate a stored settings record.
    pub fn from_stored(stored: StoredSettings) -> Result<Self> {
        let threshold = stored.long_request_threshold;
        if !valid_threshold(threshold) {
            return Err(Error::InvalidSetting {
                key: "long_request_threshold",
                reason: format!(
                    "must be a positive number of seconds up to {MAX_THRESHOLD_SECS}, got {threshold}"
                ),
            });
        }

        let volume = stored.sound_volume;
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(Error::InvalidSetting {
                key: "sound_volume",
                reason: format!("must be between 0 and 1, got {volume}"),
            });
        }

        warn_invalid_patterns("whitelist_domains", &stored.whitelist_domains);
        warn_invalid_patterns("blacklist_domains", &stored.blacklist_domains);

        Ok(Self {
            filter: FilterConfig {
                mode: FilterMode::from_name(&stored.domain_filter_mode),
                whitelist: stored.whitelist_domains,
                blacklist: stored.blacklist_domains,
            },
            alert: AlertConfig {
                threshold_secs: threshold,
                os_notifications: stored.show_os_notifications,
            },
            sound: SoundSettings {
                volume,
                custom_location: non_empty(stored.custom_sound_location),
                custom_name: non_empty(stored.custom_sound_file_name),
            },
        })
    }

    /// Convert back into the stored shape.
    pub fn to_stored(&self) -> StoredSettings {
        StoredSettings {
            long_request_threshold: self.alert.threshold_secs,
            domain_filter_mode: self.filter.mode.as_str().to_string(),
            whitelist_domains: self.filter.whitelist.clone(),
            blacklist_domains: self.filter.blacklist.clone(),
            sound_volume: self.sound.volume,
            custom_sound_location: self.sound.custom_location.clone(),
            custom_sound_file_name: self.sound.custom_name.clone(),
            show_os_notifications: self.alert.os_notifications,
        }
    }

    /// Load and validate settings from `path` and `REQWATCH_*` variables.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        SettingsLoader::new().file(path).env_prefix(ENV_PREFIX).try_load()
    }

    /// Like [`try_load`](Self::try_load), falling back to the defaults for
    /// every field on any error.
    pub fn load(path: impl AsRef<Path>) -> Self {
        SettingsLoader::new().file(path).env_prefix(ENV_PREFIX).load()
    }

    /// Which parts of `next` differ from `self`.
    pub fn diff(&self, next: &Settings) -> SettingsDiff {
        SettingsDiff::between(self, next)
    }

    /// Apply a change notification and return the resulting snapshot.
    ///
    /// `changes` maps setting keys (snake_case or camelCase) to their new
    /// values. A `null` value, or a value of the wrong type, resets that key
    /// to its default. Unknown keys are ignored.
    pub fn apply_changes(&self, changes: &Map<String, Value>) -> Self {
        let mut next = self.clone();

        for (key, value) in changes {
            match snake_case(key).as_str() {
                "long_request_threshold" => {
                    next.alert.threshold_secs = value
                        .as_f64()
                        .filter(|t| valid_threshold(*t))
                        .unwrap_or(DEFAULT_THRESHOLD_SECS);
                }
                "domain_filter_mode" => {
                    next.filter.mode = value.as_str().map(FilterMode::from_name).unwrap_or_default();
                }
                "whitelist_domains" => {
                    next.filter.whitelist = domain_list_value(value);
                    warn_invalid_patterns("whitelist_domains", &next.filter.whitelist);
                }
                "blacklist_domains" => {
                    next.filter.blacklist = domain_list_value(value);
                    warn_invalid_patterns("blacklist_domains", &next.filter.blacklist);
                }
                "sound_volume" => {
                    next.sound.volume = value
                        .as_f64()
                        .filter(|v| (0.0..=1.0).contains(v))
                        .map(|v| v as f32)
                        .unwrap_or(DEFAULT_VOLUME);
                }
                "custom_sound_location" | "custom_sound_data_url" => {
                    next.sound.custom_location = non_empty(value.as_str().map(str::to_string));
                }
                "custom_sound_file_name" => {
                    next.sound.custom_name = non_empty(value.as_str().map(str::to_string));
                }
                "show_os_notifications" => {
                    next.alert.os_notifications = value.as_bool().unwrap_or(false);
                }
                _ => debug!(key = %key, "Ignoring unknown setting"),
            }
        }

        next
    }
}

/// Which parts of two snapshots differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettingsDiff {
    pub filter: bool,
    pub alert: bool,
    pub sound: bool,
}

impl SettingsDiff {
    pub fn between(old: &Settings, new: &Settings) -> Self {
        Self {
            filter: old.filter != new.filter,
            alert: old.alert != new.alert,
            sound: old.sound != new.sound,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.filter || self.alert || self.sound)
    }
}

/// Layered settings loader.
///
/// Sources, lowest priority first: built-in defaults, the settings file,
/// environment variables (when a prefix is set), explicit overrides.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    path: Option<PathBuf>,
    env_prefix: Option<String>,
    threshold_override: Option<f64>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from this file. The format follows the extension
    /// (`.toml`, `.json`, `.yaml`).
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Also read `<PREFIX>_<KEY>` environment variables.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Force the long-request threshold regardless of other sources.
    pub fn threshold_override(mut self, secs: f64) -> Self {
        self.threshold_override = Some(secs);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load and validate settings.
    pub fn try_load(&self) -> Result<Settings> {
        let mut builder = Config::builder();

        if let Some(path) = &self.path {
            builder = builder.add_source(File::from(path.as_path()));
        }
        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(Environment::with_prefix(prefix).try_parsing(true));
        }
        if let Some(secs) = self.threshold_override {
            builder = builder.set_override("long_request_threshold", secs)?;
        }

        let stored: StoredSettings = builder.build()?.try_deserialize()?;
        Settings::from_stored(stored)
    }

    /// Load settings, falling back to the defaults for every field if
    /// anything goes wrong.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => {
                debug!(?settings, "Settings loaded");
                settings
            }
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        }
    }
}

fn valid_threshold(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0 && secs <= MAX_THRESHOLD_SECS
}

fn warn_invalid_patterns(list: &str, patterns: &[String]) {
    for pattern in patterns.iter().filter(|p| !is_valid_pattern(p)) {
        warn!(list, pattern = %pattern, "Domain pattern will never match");
    }
}

fn domain_list_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => parse_domain_list(text),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(parse_domain_list)
            .collect(),
        _ => Vec::new(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::Builder;

    fn settings_file(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(extension).tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn changes(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.alert.threshold_secs, 10.0);
        assert_eq!(settings.alert.cooldown_ms(), 3_000);
        assert!(!settings.alert.os_notifications);
        assert_eq!(settings.filter.mode, FilterMode::All);
        assert_eq!(settings.sound.volume, 0.7);
        assert_eq!(settings.sound.source(), SoundSource::Bundled);
    }

    #[test]
    fn test_from_stored_defaults_match_default() {
        let settings = Settings::from_stored(StoredSettings::default()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_from_stored_rejects_bad_threshold() {
        for threshold in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e30] {
            let stored = StoredSettings {
                long_request_threshold: threshold,
                ..StoredSettings::default()
            };
            assert!(Settings::from_stored(stored).is_err());
        }
    }

    #[test]
    fn test_from_stored_rejects_bad_volume() {
        let stored = StoredSettings {
            sound_volume: 1.5,
            ..StoredSettings::default()
        };
        assert!(matches!(
            Settings::from_stored(stored),
            Err(Error::InvalidSetting { key: "sound_volume", .. })
        ));
    }

    #[test]
    fn test_from_stored_unknown_mode_is_all() {
        let stored = StoredSettings {
            domain_filter_mode: "greylist".to_string(),
            ..StoredSettings::default()
        };
        assert_eq!(Settings::from_stored(stored).unwrap().filter.mode, FilterMode::All);
    }

    #[test]
    fn test_from_stored_empty_custom_sound_is_bundled() {
        let stored = StoredSettings {
            custom_sound_location: Some("  ".to_string()),
            ..StoredSettings::default()
        };
        assert_eq!(
            Settings::from_stored(stored).unwrap().sound.source(),
            SoundSource::Bundled
        );
    }

    #[test]
    fn test_load_toml_file() {
        let file = settings_file(
            ".toml",
            r#"
long_request_threshold = 4.5
domain_filter_mode = "blacklist"
blacklist_domains = "ads.test,tracker.net"
show_os_notifications = true
custom_sound_location = "/usr/share/sounds/ding.ogg"
custom_sound_file_name = "ding.ogg"
"#,
        );

        let settings = SettingsLoader::new().file(file.path()).try_load().unwrap();
        assert_eq!(settings.alert.threshold_secs, 4.5);
        assert!(settings.alert.os_notifications);
        assert_eq!(settings.filter.mode, FilterMode::Blacklist);
        assert_eq!(settings.filter.blacklist, vec!["ads.test", "tracker.net"]);
        assert_eq!(
            settings.sound.source(),
            SoundSource::Custom {
                location: "/usr/share/sounds/ding.ogg".to_string(),
                name: Some("ding.ogg".to_string()),
            }
        );
    }

    #[test]
    fn test_load_json_file_with_newline_lists() {
        let file = settings_file(
            ".json",
            r#"{"domain_filter_mode": "whitelist", "whitelist_domains": "example.com\nfoo.test"}"#,
        );

        let settings = Settings::load(file.path());
        assert_eq!(settings.filter.mode, FilterMode::Whitelist);
        assert_eq!(settings.filter.whitelist, vec!["example.com", "foo.test"]);
    }

    #[test]
    fn test_load_falls_back_to_defaults_for_every_field() {
        // The threshold is invalid; the otherwise-valid fields must not survive.
        let file = settings_file(
            ".toml",
            r#"
long_request_threshold = -5
show_os_notifications = true
domain_filter_mode = "whitelist"
"#,
        );

        let settings = Settings::load(file.path());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_try_load_missing_file_is_error() {
        assert!(matches!(
            Settings::try_load("/nonexistent/reqwatch/settings.toml"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let settings = Settings::load("/nonexistent/reqwatch/settings.toml");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_unparseable_file_uses_defaults() {
        let file = settings_file(".toml", "this is = = not toml");
        assert_eq!(Settings::load(file.path()), Settings::default());
    }

    #[test]
    fn test_threshold_override_wins_over_file() {
        let file = settings_file(".toml", "long_request_threshold = 30\n");
        let settings = SettingsLoader::new()
            .file(file.path())
            .threshold_override(2.0)
            .try_load()
            .unwrap();
        assert_eq!(settings.alert.threshold_secs, 2.0);
    }

    #[test]
    fn test_apply_changes_replaces_values() {
        let base = Settings::default();
        let next = base.apply_changes(&changes(json!({
            "long_request_threshold": 3,
            "domain_filter_mode": "whitelist",
            "whitelist_domains": "a.com,b.com",
            "show_os_notifications": true,
            "sound_volume": 0.25
        })));

        assert_eq!(next.alert.threshold_secs, 3.0);
        assert_eq!(next.filter.mode, FilterMode::Whitelist);
        assert_eq!(next.filter.whitelist, vec!["a.com", "b.com"]);
        assert!(next.alert.os_notifications);
        assert_eq!(next.sound.volume, 0.25);
        // The original snapshot is untouched.
        assert_eq!(base, Settings::default());
    }

    #[test]
    fn test_apply_changes_accepts_camel_case_keys() {
        let next = Settings::default().apply_changes(&changes(json!({
            "longRequestThreshold": 20,
            "blacklistDomains": "x.test\ny.test",
            "customSoundDataUrl": "data:audio/ogg;base64,AAAA",
            "customSoundFileName": "beep.ogg"
        })));

        assert_eq!(next.alert.threshold_secs, 20.0);
        assert_eq!(next.filter.blacklist, vec!["x.test", "y.test"]);
        assert_eq!(
            next.sound.source(),
            SoundSource::Custom {
                location: "data:audio/ogg;base64,AAAA".to_string(),
                name: Some("beep.ogg".to_string()),
            }
        );
    }

    #[test]
    fn test_apply_changes_null_and_wrong_type_reset_to_default() {
        let custom = Settings::default().apply_changes(&changes(json!({
            "long_request_threshold": 42,
            "show_os_notifications": true,
            "sound_volume": 0.1,
            "whitelist_domains": "a.com"
        })));

        let reset = custom.apply_changes(&changes(json!({
            "long_request_threshold": null,
            "show_os_notifications": "yes",
            "sound_volume": 7,
            "whitelist_domains": null
        })));

        assert_eq!(reset.alert.threshold_secs, DEFAULT_THRESHOLD_SECS);
        assert!(!reset.alert.os_notifications);
        assert_eq!(reset.sound.volume, DEFAULT_VOLUME);
        assert!(reset.filter.whitelist.is_empty());
    }

    #[test]
    fn test_huge_threshold_is_rejected() {
        let file = settings_file(".toml", "long_request_threshold = 1e30\n");
        assert!(SettingsLoader::new().file(file.path()).try_load().is_err());
        assert_eq!(
            SettingsLoader::new().file(file.path()).load(),
            Settings::default()
        );

        let changed =
            Settings::default().apply_changes(&changes(json!({ "long_request_threshold": 1e30 })));
        assert_eq!(changed.alert.threshold_secs, DEFAULT_THRESHOLD_SECS);
    }

    #[test]
    fn test_apply_changes_ignores_unknown_keys() {
        let base = Settings::default();
        let next = base.apply_changes(&changes(json!({ "theme": "dark" })));
        assert_eq!(next, base);
    }

    #[test]
    fn test_diff() {
        let base = Settings::default();
        assert!(SettingsDiff::between(&base, &base).is_empty());

        let louder = base.apply_changes(&changes(json!({ "sound_volume": 1.0 })));
        let diff = base.diff(&louder);
        assert!(diff.sound);
        assert!(!diff.filter);
        assert!(!diff.alert);

        let filtered = base.apply_changes(&changes(json!({ "domain_filter_mode": "blacklist" })));
        let diff = SettingsDiff::between(&base, &filtered);
        assert!(diff.filter);
        assert!(!diff.sound);
    }

    #[test]
    fn test_to_stored_round_trips_through_from_stored() {
        let settings = Settings::default().apply_changes(&changes(json!({
            "domain_filter_mode": "whitelist",
            "whitelist_domains": "example.com",
            "long_request_threshold": 7.5
        })));
        assert_eq!(Settings::from_stored(settings.to_stored()).unwrap(), settings);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("longRequestThreshold"), "long_request_threshold");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }
}
