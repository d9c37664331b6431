//! Event source abstraction.
//!
//! Request lifecycle events reach the engine from a file replay, a byte
//! stream (TCP connection, stdin) or an in-process channel. All of them carry
//! the same newline-delimited JSON encoding of [`Event`]:
//!
//! ```text
//! {"type":"request_begin","request_id":"7","url":"https://api.test/x","view_id":3,"kind":"fetch","timestamp_ms":0}
//! {"type":"view_focus","view_id":3,"active":false,"window_focused":true}
//! {"type":"request_end","request_id":"7","timestamp_ms":12000}
//! ```

mod channel;
mod file;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use async_trait::async_trait;
use reqwatch_types::Event;

/// Something that produces request lifecycle events.
///
/// # Example
///
/// ```
/// use reqwatch::{ChannelSource, EventSource};
/// use reqwatch_types::Event;
///
/// # tokio_test::block_on(async {
/// let (tx, mut source) = ChannelSource::create("test");
/// tx.send(Event::PlayTestSound).await.unwrap();
/// drop(tx);
///
/// assert_eq!(source.next_event().await, Some(Event::PlayTestSound));
/// assert_eq!(source.next_event().await, None);
/// # });
/// ```
#[async_trait]
pub trait EventSource: Send + Debug {
    /// Wait for the next event.
    ///
    /// Returns `None` once the source is exhausted; later calls keep
    /// returning `None`.
    ///
    /// Must be cancel-safe: [`Monitor::run`](crate::Monitor::run) drops an
    /// unfinished call whenever a settings update arrives first, and no event
    /// may be lost when that happens.
    async fn next_event(&mut self) -> Option<Event>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// The most recent error (unreadable input, malformed line), if any.
    fn error(&self) -> Option<String>;
}

/// Parse one line of newline-delimited JSON.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub(crate) fn parse_line(line: &str) -> Result<Option<Event>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwatch_types::{RequestKind, ViewId};

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   \r\n").unwrap().is_none());
        assert!(parse_line("# recorded 2024-05-01").unwrap().is_none());
    }

    #[test]
    fn test_parse_line_begin() {
        let event = parse_line(
            r#"{"type":"request_begin","request_id":7,"url":"https://a.test/","view_id":3,"kind":"xmlhttprequest","timestamp_ms":5}"#,
        )
        .unwrap()
        .unwrap();
        match event {
            Event::RequestBegin(begin) => {
                assert_eq!(begin.request_id.as_str(), "7");
                assert_eq!(begin.view_id, ViewId(3));
                assert_eq!(begin.kind, RequestKind::XmlHttpRequest);
                assert_eq!(begin.timestamp_ms, Some(5.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(parse_line("not json").is_err());
        assert!(parse_line(r#"{"type":"teleport"}"#).is_err());
    }
}
