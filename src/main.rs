use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reqwatch::duration::{format_duration, parse_duration};
use reqwatch::settings::ENV_PREFIX;
use reqwatch::{
    AlertEngine, BellPlayback, CommandNotifier, CommandPlayback, EventSource, FileSource,
    LogNotifier, Monitor, NotificationSink, PlaybackSink, Settings, SettingsLoader,
    SettingsWatcher, StreamSource, ViewRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SoundMode {
    /// Ring the terminal bell
    Bell,
    /// Run the command given with --sound-command
    Command,
    /// Never make a sound
    None,
}

#[derive(Parser, Debug)]
#[command(name = "reqwatch", version)]
#[command(about = "Alert when a request in a view you are not looking at takes too long")]
struct Args {
    /// Replay events from a newline-delimited JSON file instead of stdin
    #[arg(short, long, conflicts_with = "connect")]
    events: Option<PathBuf>,

    /// Keep reading the events file as it grows
    #[arg(long, requires = "events")]
    follow: bool,

    /// Connect to a TCP endpoint that streams events (host:port)
    #[arg(short, long, conflicts_with = "events")]
    connect: Option<String>,

    /// Settings file (TOML, JSON or YAML); reloaded when it changes
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// How often to check the settings file for changes, in seconds
    #[arg(long, default_value = "2")]
    watch_interval: u64,

    /// Override the long request threshold (e.g. "10", "2500ms", "1m")
    #[arg(short, long)]
    threshold: Option<String>,

    /// How alert sounds are played
    #[arg(long, value_enum, default_value_t = SoundMode::Bell)]
    sound: SoundMode,

    /// Player command for --sound command; {sound} and {volume} are substituted
    #[arg(long, value_name = "CMD")]
    sound_command: Option<String>,

    /// Sound file used by the player when no custom sound is configured
    #[arg(long, value_name = "PATH")]
    bundled_sound: Option<String>,

    /// Notifier command; {id}, {title} and {body} are substituted.
    /// Without it notifications are written to the log
    #[arg(long, value_name = "CMD")]
    notify_command: Option<String>,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    print_settings: bool,
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

fn playback_for(args: &Args) -> Result<Option<Arc<dyn PlaybackSink>>> {
    Ok(match args.sound {
        SoundMode::None => None,
        SoundMode::Bell => Some(Arc::new(BellPlayback::new())),
        SoundMode::Command => {
            let Some(command) = args.sound_command.as_deref() else {
                bail!("--sound command requires --sound-command");
            };
            let argv = split_command(command);
            if argv.is_empty() {
                bail!("--sound-command is empty");
            }
            let mut playback = CommandPlayback::new(argv);
            if let Some(bundled) = &args.bundled_sound {
                playback = playback.with_bundled(bundled.clone());
            }
            Some(Arc::new(playback))
        }
    })
}

fn notifier_for(args: &Args) -> Result<Arc<dyn NotificationSink>> {
    Ok(match args.notify_command.as_deref() {
        Some(command) => {
            let argv = split_command(command);
            if argv.is_empty() {
                bail!("--notify-command is empty");
            }
            Arc::new(CommandNotifier::new(argv))
        }
        None => Arc::new(LogNotifier),
    })
}

fn settings_loader(args: &Args) -> Result<SettingsLoader> {
    let mut loader = SettingsLoader::new().env_prefix(ENV_PREFIX);
    if let Some(path) = &args.settings {
        loader = loader.file(path);
    }
    if let Some(threshold) = &args.threshold {
        let threshold = parse_duration(threshold)
            .with_context(|| format!("invalid --threshold {:?}", threshold))?;
        if threshold.is_zero() {
            bail!("--threshold must be greater than zero");
        }
        loader = loader.threshold_override(threshold.as_secs_f64());
    }
    Ok(loader)
}

async fn open_source(args: &Args) -> Result<Box<dyn EventSource>> {
    if let Some(path) = &args.events {
        let mut source = FileSource::new(path);
        if args.follow {
            source = source.follow(Duration::from_millis(250));
        }
        return Ok(Box::new(source));
    }

    if let Some(addr) = &args.connect {
        info!(addr = %addr, "Connecting");
        let source = StreamSource::connect(addr.as_str(), addr)
            .await
            .with_context(|| format!("failed to connect to {}", addr))?;
        return Ok(Box::new(source));
    }

    Ok(Box::new(StreamSource::stdin()))
}

fn threshold_label(secs: f64) -> String {
    match Duration::try_from_secs_f64(secs) {
        Ok(threshold) => format_duration(threshold),
        Err(_) => format!("{secs}s"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let loader = settings_loader(&args)?;

    if args.print_settings {
        let settings = loader.load();
        println!("{}", serde_json::to_string_pretty(&settings.to_stored())?);
        return Ok(());
    }

    // Only a settings file can change at runtime.
    let (settings, settings_rx, watcher): (Settings, Option<watch::Receiver<Settings>>, _) =
        if args.settings.is_some() {
            let interval = Duration::from_secs(args.watch_interval.max(1));
            let (rx, handle) = SettingsWatcher::new(loader).spawn(interval);
            let initial = rx.borrow().clone();
            (initial, Some(rx), Some(handle))
        } else {
            (loader.load(), None, None)
        };

    info!(
        threshold = %threshold_label(settings.alert.threshold_secs),
        mode = settings.filter.mode.as_str(),
        notifications = settings.alert.os_notifications,
        sound = ?args.sound,
        "Starting reqwatch"
    );

    let views = ViewRegistry::new();
    let mut builder = AlertEngine::builder(Arc::new(views.clone()))
        .settings(settings)
        .notifications(notifier_for(&args)?);
    if let Some(playback) = playback_for(&args)? {
        builder = builder.playback(playback);
    }
    let mut monitor = Monitor::new(builder.build(), views);

    let mut source = open_source(&args).await?;

    tokio::select! {
        stats = monitor.run(source.as_mut(), settings_rx) => {
            info!(?stats, "Done");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    if let Some(handle) = watcher {
        handle.abort();
    }

    let engine = monitor.engine();
    let stats = engine.stats();
    info!(
        tracked = stats.tracked,
        ignored = stats.ignored,
        alerted = stats.alerted,
        sounds_played = stats.sounds_played,
        notifications_sent = stats.notifications_sent,
        dispatch_failures = stats.dispatch_failures,
        "Summary"
    );
    if engine.pending_count() > 0 {
        warn!(pending = engine.pending_count(), "Requests still pending at exit");
    }

    Ok(())
}
