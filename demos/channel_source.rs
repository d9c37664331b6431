//! Example: Embedding reqwatch behind a channel
//!
//! Shows how a host application pushes events straight into the engine,
//! here from a task that simulates a user switching between two tabs while
//! requests of various lengths complete.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example channel_source
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwatch::{
    AlertEngine, BellPlayback, ChannelSource, LogNotifier, Monitor, Settings, ViewRegistry,
};
use reqwatch_types::{Event, RequestBegin, RequestEnd, RequestKind, ViewFocusChange, ViewId};

fn focus(view: i64, active: bool) -> Event {
    Event::ViewFocus(ViewFocusChange {
        view_id: ViewId(view),
        active,
        window_focused: true,
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    println!("Channel source example");
    println!("Simulating two tabs with a 1 second threshold...\n");

    let mut settings = Settings::default();
    settings.alert.threshold_secs = 1.0;
    settings.alert.os_notifications = true;

    let views = ViewRegistry::new();
    let engine = AlertEngine::builder(Arc::new(views.clone()))
        .playback(Arc::new(BellPlayback::new()))
        .notifications(Arc::new(LogNotifier))
        .settings(settings)
        .build();
    let mut monitor = Monitor::new(engine, views);

    // Create a channel source - this returns both a sender and the source
    let (tx, mut source) = ChannelSource::create("simulated-browser");

    tokio::spawn(async move {
        let script = [
            // Tab 1 is in front, tab 2 in the background.
            focus(1, true),
            focus(2, false),
            Event::RequestBegin(RequestBegin::new(
                "front",
                "https://app.example.com/report",
                ViewId(1),
                RequestKind::Fetch,
            )),
            Event::RequestBegin(RequestBegin::new(
                "back",
                "https://api.example.com/export",
                ViewId(2),
                RequestKind::XmlHttpRequest,
            )),
            Event::RequestBegin(RequestBegin::new(
                "quick",
                "https://api.example.com/ping",
                ViewId(2),
                RequestKind::Fetch,
            )),
            Event::RequestEnd(RequestEnd::new("quick")),
        ];
        for event in script {
            if tx.send(event).await.is_err() {
                return;
            }
        }

        tokio::time::sleep(Duration::from_millis(1_500)).await;

        // Both long: the focused one stays quiet, the background one alerts.
        for event in [
            Event::RequestEnd(RequestEnd::new("front")),
            Event::RequestEnd(RequestEnd::new("back").failed()),
            Event::PlayTestSound,
        ] {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    });

    let stats = monitor.run(&mut source, None).await;
    println!(
        "\n{} tracked, {} short, {} focused, {} alerted, {} sounds",
        stats.tracked, stats.short, stats.focused, stats.alerted, stats.sounds_played
    );
}
