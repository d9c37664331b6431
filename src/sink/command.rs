//! Sinks backed by external programs.
//!
//! Both sinks take an argv template. Placeholders in braces are substituted
//! per call, e.g. `paplay --volume={volume} {sound}` or
//! `notify-send --app-name=reqwatch {title} {body}`.

use std::process::Stdio;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{Notification, NotificationSink, PlaybackSink};
use crate::error::SinkError;
use crate::settings::{SoundSettings, SoundSource};

/// Substitute `{name}` placeholders in every argument.
fn render(template: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{}}}", name), value)
            })
        })
        .collect()
}

fn command_for(argv: &[String]) -> Result<Command, SinkError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| SinkError::Playback("empty command".to_string()))?;
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    Ok(command)
}

#[derive(Debug, Clone)]
struct LoadedSound {
    location: String,
    volume: f32,
}

/// Plays the sound by running an external player.
///
/// `{sound}` expands to the sound location and `{volume}` to the volume in
/// `[0, 1]`. The player runs in the background; `play` returns once it has
/// been started.
#[derive(Debug)]
pub struct CommandPlayback {
    template: Vec<String>,
    bundled: Option<String>,
    loaded: RwLock<Option<LoadedSound>>,
}

impl CommandPlayback {
    pub fn new<I, S>(template: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            template: template.into_iter().map(Into::into).collect(),
            bundled: None,
            loaded: RwLock::new(None),
        }
    }

    /// Sound played when no custom sound is configured.
    pub fn with_bundled(mut self, location: impl Into<String>) -> Self {
        self.bundled = Some(location.into());
        self
    }

    fn uses_sound(&self) -> bool {
        self.template.iter().any(|arg| arg.contains("{sound}"))
    }

    /// The argv the next `play` would run, if a sound is loaded.
    pub fn command_line(&self) -> Option<Vec<String>> {
        let loaded = self.loaded.read();
        let sound = loaded.as_ref()?;
        let volume = format!("{:.2}", sound.volume);
        Some(render(
            &self.template,
            &[("sound", sound.location.as_str()), ("volume", volume.as_str())],
        ))
    }
}

#[async_trait]
impl PlaybackSink for CommandPlayback {
    fn load(&self, sound: &SoundSettings) -> Result<(), SinkError> {
        let location = match sound.source() {
            SoundSource::Custom { location, .. } if location.starts_with("data:") => {
                *self.loaded.write() = None;
                return Err(SinkError::Playback(
                    "inline data sounds cannot be passed to an external player".to_string(),
                ));
            }
            SoundSource::Custom { location, .. } => location,
            SoundSource::Bundled => match &self.bundled {
                Some(bundled) => bundled.clone(),
                // The player picks its own sound.
                None if !self.uses_sound() => String::new(),
                None => {
                    *self.loaded.write() = None;
                    return Err(SinkError::NoSound);
                }
            },
        };

        debug!(location = %location, volume = sound.volume, "Sound loaded");
        *self.loaded.write() = Some(LoadedSound {
            location,
            volume: sound.volume,
        });
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.read().is_some()
    }

    async fn play(&self) -> Result<(), SinkError> {
        let argv = self.command_line().ok_or(SinkError::NoSound)?;
        let mut child = command_for(&argv)?
            .spawn()
            .map_err(|source| SinkError::Spawn {
                program: argv[0].clone(),
                source,
            })?;

        let program = argv[0].clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(program = %program, %status, "Sound player failed"),
                Err(e) => warn!(program = %program, error = %e, "Sound player failed"),
            }
        });
        Ok(())
    }
}

/// Shows notifications by running an external notifier.
///
/// `{id}`, `{title}` and `{body}` expand to the notification fields. The
/// notifier is awaited and a non-zero exit status is an error.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    template: Vec<String>,
}

impl CommandNotifier {
    pub fn new<I, S>(template: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            template: template.into_iter().map(Into::into).collect(),
        }
    }

    /// `notify-send <title> <body>`.
    pub fn notify_send() -> Self {
        Self::new(["notify-send", "--app-name=reqwatch", "{title}", "{body}"])
    }

    pub fn command_line(&self, notification: &Notification) -> Vec<String> {
        render(
            &self.template,
            &[
                ("id", notification.id.as_str()),
                ("title", notification.title.as_str()),
                ("body", notification.body.as_str()),
            ],
        )
    }
}

#[async_trait]
impl NotificationSink for CommandNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        let argv = self.command_line(notification);
        let status = command_for(&argv)
            .map_err(|_| SinkError::Notification("empty command".to_string()))?
            .status()
            .await
            .map_err(|source| SinkError::Spawn {
                program: argv[0].clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SinkError::Notification(format!("`{}` exited with {}", argv[0], status)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwatch_types::RequestId;

    fn custom(location: &str) -> SoundSettings {
        SoundSettings {
            volume: 0.5,
            custom_location: Some(location.to_string()),
            custom_name: None,
        }
    }

    #[test]
    fn test_render_placeholders() {
        let template = vec!["play".to_string(), "-v{volume}".to_string(), "{sound}".to_string()];
        assert_eq!(
            render(&template, &[("sound", "/tmp/a.ogg"), ("volume", "0.50")]),
            vec!["play", "-v0.50", "/tmp/a.ogg"]
        );
    }

    #[test]
    fn test_playback_command_line_uses_custom_sound() {
        let playback = CommandPlayback::new(["paplay", "{sound}"]).with_bundled("/usr/share/bell.oga");
        assert!(playback.command_line().is_none());

        playback.load(&custom("/home/me/ding.ogg")).unwrap();
        assert_eq!(playback.command_line().unwrap(), vec!["paplay", "/home/me/ding.ogg"]);

        playback.load(&SoundSettings::default()).unwrap();
        assert_eq!(playback.command_line().unwrap(), vec!["paplay", "/usr/share/bell.oga"]);
    }

    #[test]
    fn test_playback_without_bundled_sound() {
        let needs_sound = CommandPlayback::new(["paplay", "{sound}"]);
        assert!(matches!(
            needs_sound.load(&SoundSettings::default()),
            Err(SinkError::NoSound)
        ));
        assert!(!needs_sound.is_loaded());

        let own_sound = CommandPlayback::new(["beep"]);
        own_sound.load(&SoundSettings::default()).unwrap();
        assert!(own_sound.is_loaded());
    }

    #[test]
    fn test_playback_rejects_data_urls() {
        let playback = CommandPlayback::new(["paplay", "{sound}"]);
        playback.load(&custom("/tmp/ok.ogg")).unwrap();
        assert!(playback.load(&custom("data:audio/ogg;base64,AAAA")).is_err());
        assert!(!playback.is_loaded());
    }

    #[tokio::test]
    async fn test_play_unloaded_is_no_sound() {
        let playback = CommandPlayback::new(["true"]);
        assert!(matches!(playback.play().await, Err(SinkError::NoSound)));
    }

    #[tokio::test]
    async fn test_play_missing_program_is_spawn_error() {
        let playback = CommandPlayback::new(["/nonexistent/reqwatch-player"]);
        playback.load(&SoundSettings::default()).unwrap();
        assert!(matches!(playback.play().await, Err(SinkError::Spawn { .. })));
    }

    #[test]
    fn test_notifier_command_line() {
        let notifier = CommandNotifier::new(["notify", "--id={id}", "{title}", "{body}"]);
        let n = Notification::long_request(&RequestId::new("9"), "a.test", 11.0, 5);
        assert_eq!(
            notifier.command_line(&n),
            vec![
                "notify".to_string(),
                "--id=long-request-9-5".to_string(),
                n.title.clone(),
                n.body.clone(),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_notifier_exit_status() {
        let n = Notification::long_request(&RequestId::new("1"), "a.test", 11.0, 0);
        CommandNotifier::new(["true"]).notify(&n).await.unwrap();
        assert!(matches!(
            CommandNotifier::new(["false"]).notify(&n).await,
            Err(SinkError::Notification(_))
        ));
    }
}
