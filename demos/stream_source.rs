//! Example: Receiving events over TCP
//!
//! Starts a tiny TCP server that streams a few newline-delimited JSON events
//! and connects a StreamSource to it. A real deployment would point
//! `reqwatch --connect` at a browser bridge instead.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example stream_source
//! ```

use std::sync::Arc;

use reqwatch::{AlertEngine, LogNotifier, Monitor, Settings, StreamSource, ViewRegistry};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

const EVENTS: &str = concat!(
    r#"{"type":"view_focus","view_id":3,"active":false,"window_focused":false}"#,
    "\n",
    r#"{"type":"request_begin","request_id":"7","url":"https://slow.example.com/x","view_id":3,"kind":"fetch","timestamp_ms":0}"#,
    "\n",
    r#"{"type":"request_end","request_id":"7","timestamp_ms":12000}"#,
    "\n",
);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    println!("Serving events on {}", addr);

    tokio::spawn(async move {
        if let Ok((mut socket, peer)) = listener.accept().await {
            println!("Client connected from {}", peer);
            let _ = socket.write_all(EVENTS.as_bytes()).await;
        }
    });

    let mut settings = Settings::default();
    settings.alert.os_notifications = true;

    let views = ViewRegistry::new();
    let engine = AlertEngine::builder(Arc::new(views.clone()))
        .notifications(Arc::new(LogNotifier))
        .settings(settings)
        .build();
    let mut monitor = Monitor::new(engine, views);

    let mut source = StreamSource::connect(addr, &addr.to_string()).await?;
    let stats = monitor.run(&mut source, None).await;

    println!("\n{} alerts, {} notifications", stats.alerted, stats.notifications_sent);
    Ok(())
}
