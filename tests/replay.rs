//! Replays recorded event files through the whole pipeline.

use std::io::Write;
use std::sync::Arc;

use reqwatch::{
    AlertEngine, Clock, FileSource, ManualClock, MemoryNotifier, MemoryPlayback, Monitor, Settings,
    SettingsLoader, ViewRegistry,
};
use tempfile::{Builder, NamedTempFile};

struct Rig {
    monitor: Monitor,
    clock: Arc<ManualClock>,
    playback: Arc<MemoryPlayback>,
    notifier: Arc<MemoryNotifier>,
}

fn rig(settings: Settings) -> Rig {
    let views = ViewRegistry::new();
    let clock = Arc::new(ManualClock::starting_at(1_700_000_000_000));
    let playback = Arc::new(MemoryPlayback::new());
    let notifier = Arc::new(MemoryNotifier::new());
    let engine = AlertEngine::builder(Arc::new(views.clone()))
        .clock(clock.clone())
        .playback(playback.clone())
        .notifications(notifier.clone())
        .settings(settings)
        .build();
    Rig {
        monitor: Monitor::new(engine, views),
        clock,
        playback,
        notifier,
    }
}

fn event_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

fn settings_file(contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn slow_request_in_background_view_alerts() {
    let settings = settings_file("show_os_notifications = true\n");
    let settings = SettingsLoader::new().file(settings.path()).try_load().unwrap();
    let mut rig = rig(settings);

    let events = event_file(&[
        r#"{"type":"view_focus","view_id":5,"active":false,"window_focused":true}"#,
        r#"{"type":"request_begin","request_id":1,"url":"https://slow.example.com/x","view_id":5,"kind":"fetch","timestamp_ms":0}"#,
        r#"{"type":"request_end","request_id":1,"timestamp_ms":12000}"#,
    ]);

    let mut source = FileSource::new(events.path());
    let stats = rig.monitor.run(&mut source, None).await;

    assert_eq!(stats.alerted, 1);
    assert_eq!(stats.sounds_played, 1);
    assert_eq!(rig.playback.plays(), 1);

    let sent = rig.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("slow.example.com"));
    assert!(sent[0].body.contains("12.00"));
    assert_eq!(rig.monitor.engine().pending_count(), 0);
}

#[tokio::test]
async fn slow_request_in_focused_view_is_quiet() {
    let mut rig = rig(Settings::default());

    let events = event_file(&[
        r#"{"type":"view_focus","view_id":5,"active":true,"window_focused":true}"#,
        r#"{"type":"request_begin","request_id":1,"url":"https://slow.example.com/x","view_id":5,"kind":"fetch","timestamp_ms":0}"#,
        r#"{"type":"request_end","request_id":1,"timestamp_ms":12000}"#,
    ]);

    let mut source = FileSource::new(events.path());
    let stats = rig.monitor.run(&mut source, None).await;

    assert_eq!(stats.alerted, 0);
    assert_eq!(stats.focused, 1);
    assert_eq!(rig.playback.plays(), 0);
    assert_eq!(rig.notifier.count(), 0);
}

#[tokio::test]
async fn burst_of_slow_requests_plays_one_sound() {
    let mut settings = Settings::default();
    settings.alert.os_notifications = true;
    let mut rig = rig(settings);

    // The manual clock does not move during the replay, so both alerts land
    // in the same cooldown window.
    let events = event_file(&[
        r#"{"type":"request_begin","request_id":"a","url":"https://one.test/","view_id":1,"kind":"main_frame","timestamp_ms":0}"#,
        r#"{"type":"request_begin","request_id":"b","url":"https://two.test/","view_id":2,"kind":"xmlhttprequest","timestamp_ms":0}"#,
        r#"{"type":"request_end","request_id":"a","timestamp_ms":10000}"#,
        r#"{"type":"request_end","request_id":"b","timestamp_ms":10500,"reason":"error"}"#,
    ]);

    let mut source = FileSource::new(events.path());
    let stats = rig.monitor.run(&mut source, None).await;

    assert_eq!(stats.alerted, 2);
    assert_eq!(stats.sounds_played, 1);
    assert_eq!(stats.sounds_cooled_down, 1);
    assert_eq!(rig.notifier.count(), 2);
    assert_eq!(rig.clock.wall_ms(), 1_700_000_000_000);
}

#[tokio::test]
async fn whitelist_and_noise_are_filtered() {
    let settings = settings_file(
        r#"
domain_filter_mode = "whitelist"
whitelist_domains = "example.com"
"#,
    );
    let settings = SettingsLoader::new().file(settings.path()).try_load().unwrap();
    let mut rig = rig(settings);

    let events = event_file(&[
        "# everything below except the first request is ignored",
        r#"{"type":"request_begin","request_id":1,"url":"https://api.example.com/a","view_id":1,"kind":"fetch","timestamp_ms":0}"#,
        r#"{"type":"request_begin","request_id":2,"url":"https://other.org/b","view_id":1,"kind":"fetch","timestamp_ms":0}"#,
        r#"{"type":"request_begin","request_id":3,"url":"https://api.example.com/logo.png","view_id":1,"kind":"image","timestamp_ms":0}"#,
        r#"{"type":"request_begin","request_id":4,"url":"https://api.example.com/sw","view_id":-1,"kind":"fetch","timestamp_ms":0}"#,
        "this line is not json",
        r#"{"type":"request_end","request_id":2,"timestamp_ms":50000}"#,
        r#"{"type":"request_end","request_id":1,"timestamp_ms":50000}"#,
    ]);

    let mut source = FileSource::new(events.path());
    let stats = rig.monitor.run(&mut source, None).await;

    assert_eq!(stats.tracked, 1);
    assert_eq!(stats.ignored, 3);
    assert_eq!(stats.unmatched_ends, 1);
    assert_eq!(stats.alerted, 1);
    assert!(source_error_mentions_parse(&events).await);
}

async fn source_error_mentions_parse(events: &NamedTempFile) -> bool {
    use reqwatch::EventSource;

    let mut source = FileSource::new(events.path());
    while source.next_event().await.is_some() {}
    source
        .error()
        .map(|e| e.contains("Parse error"))
        .unwrap_or(false)
}

#[tokio::test]
async fn unfinished_requests_stay_pending() {
    let mut rig = rig(Settings::default());

    let events = event_file(&[
        r#"{"type":"request_begin","request_id":1,"url":"https://hang.test/","view_id":1,"kind":"fetch","timestamp_ms":0}"#,
    ]);

    let mut source = FileSource::new(events.path());
    let stats = rig.monitor.run(&mut source, None).await;

    assert_eq!(stats.tracked, 1);
    assert_eq!(rig.monitor.engine().pending_count(), 1);
    assert_eq!(rig.playback.plays(), 0);
}
