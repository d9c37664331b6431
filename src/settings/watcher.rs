//! Settings file watching.
//!
//! Polls the settings file's modification time and reloads it when it
//! changes. Each reload yields a complete new snapshot.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Settings, SettingsLoader};

/// Reloads settings whenever the backing file is modified.
#[derive(Debug)]
pub struct SettingsWatcher {
    loader: SettingsLoader,
    description: String,
    current: Settings,
    last_modified: Option<SystemTime>,
    last_error: Option<String>,
    polled: bool,
}

impl SettingsWatcher {
    /// Create a watcher around a loader. The loader must have a file set for
    /// changes to ever be observed.
    pub fn new(loader: SettingsLoader) -> Self {
        let description = match loader.path() {
            Some(path) => format!("settings: {}", path.display()),
            None => "settings: defaults".to_string(),
        };
        Self {
            loader,
            description,
            current: Settings::default(),
            last_modified: None,
            last_error: None,
            polled: false,
        }
    }

    /// The most recently loaded snapshot.
    pub fn current(&self) -> &Settings {
        &self.current
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The error from the last reload, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).ok()?.modified().ok()
    }

    fn reload(&mut self) -> Settings {
        match self.loader.try_load() {
            Ok(settings) => {
                self.last_error = None;
                settings
            }
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                self.last_error = Some(e.to_string());
                Settings::default()
            }
        }
    }

    /// Check the file and return a new snapshot if it changed.
    ///
    /// The first call always loads. Later calls return `None` when the file
    /// is untouched, when it disappeared, or when the reloaded snapshot is
    /// identical to the current one.
    pub fn poll(&mut self) -> Option<Settings> {
        if !self.polled {
            self.polled = true;
            self.last_modified = self.loader.path().and_then(Self::modified_time);
            self.current = self.reload();
            return Some(self.current.clone());
        }

        let path = self.loader.path()?;
        let current_modified = Self::modified_time(path);

        let changed = match (&self.last_modified, &current_modified) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(last), Some(current)) => current != last,
        };
        if !changed {
            return None;
        }

        self.last_modified = current_modified;
        let next = self.reload();
        if next == self.current {
            debug!("Settings file touched without changes");
            return None;
        }

        info!(source = %self.description, "Settings changed");
        self.current = next;
        Some(self.current.clone())
    }

    /// Run the watcher on a background task.
    ///
    /// The receiver starts with the initial snapshot. The task exits once
    /// every receiver has been dropped.
    pub fn spawn(mut self, interval: Duration) -> (watch::Receiver<Settings>, JoinHandle<()>) {
        let initial = self.poll().unwrap_or_else(|| self.current.clone());
        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(settings) = self.poll() {
                            if tx.send(settings).is_err() {
                                break;
                            }
                        }
                    }
                    _ = tx.closed() => break,
                }
            }
            debug!(source = %self.description, "Settings watcher stopped");
        });

        (rx, handle)
    }
}
