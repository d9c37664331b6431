//! Example: Replaying a recorded event file
//!
//! Reads newline-delimited JSON events from a file, runs them through the
//! alert engine with sound and notifications going to the log, and prints
//! every alert decision.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example file_source -- path/to/events.ndjson
//! ```

use std::env;
use std::sync::Arc;

use reqwatch::{AlertEngine, EventSource, FileSource, LogNotifier, Monitor, Settings, ViewRegistry};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let path = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example file_source -- <path-to-events.ndjson>");
        eprintln!();
        eprintln!("Each line is one event, for example:");
        eprintln!(
            r#"  {{"type":"request_begin","request_id":"1","url":"https://a.test/","view_id":1,"kind":"fetch","timestamp_ms":0}}"#
        );
        eprintln!(r#"  {{"type":"request_end","request_id":"1","timestamp_ms":12000}}"#);
        std::process::exit(1);
    });

    let mut settings = Settings::default();
    settings.alert.os_notifications = true;

    let views = ViewRegistry::new();
    let engine = AlertEngine::builder(Arc::new(views.clone()))
        .notifications(Arc::new(LogNotifier))
        .settings(settings)
        .build();
    let mut monitor = Monitor::new(engine, views);

    let mut source = FileSource::new(&path);
    println!("Replaying {}", source.description());

    while let Some(event) = source.next_event().await {
        if let Some(decision) = monitor.handle(event).await {
            println!(
                "ALERT {} {} took {:.2}s (sound: {:?})",
                decision.request_id, decision.hostname, decision.duration_secs, decision.sound
            );
        }
    }

    if let Some(err) = source.error() {
        eprintln!("Last error: {}", err);
    }

    let stats = monitor.engine().stats();
    println!(
        "\n{} tracked, {} ignored, {} alerts, {} still pending",
        stats.tracked,
        stats.ignored,
        stats.alerted,
        monitor.engine().pending_count()
    );
}
