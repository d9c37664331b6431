//! Channel-based event source.
//!
//! Receives events from elsewhere in the same process.

use async_trait::async_trait;
use reqwatch_types::Event;
use tokio::sync::mpsc;

use super::EventSource;

/// An event source backed by an `mpsc` channel.
///
/// This is the source to use when reqwatch is embedded and the host pushes
/// events directly instead of serializing them. The source ends when every
/// sender has been dropped.
///
/// # Example
///
/// ```
/// use reqwatch::ChannelSource;
///
/// // Create a channel pair
/// let (tx, source) = ChannelSource::create("browser bridge");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<Event>,
    description: String,
}

impl ChannelSource {
    /// Channel capacity used by [`create`](Self::create).
    pub const CAPACITY: usize = 256;

    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - A description of where events come from
    pub fn new(receiver: mpsc::Receiver<Event>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
        }
    }

    /// Create a channel pair for sending events to a ChannelSource.
    pub fn create(source_description: &str) -> (mpsc::Sender<Event>, Self) {
        let (tx, rx) = mpsc::channel(Self::CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwatch_types::{RequestEnd, ViewId};

    #[test]
    fn test_channel_source_description() {
        let (_tx, source) = ChannelSource::create("rabbitmq://localhost");
        assert_eq!(source.description(), "channel: rabbitmq://localhost");
        assert!(source.error().is_none());
    }

    #[tokio::test]
    async fn test_channel_source_preserves_order() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.send(Event::ViewClosed { view_id: ViewId(1) }).await.unwrap();
        tx.send(Event::RequestEnd(RequestEnd::new("9"))).await.unwrap();

        assert_eq!(source.next_event().await.unwrap().name(), "view_closed");
        assert_eq!(source.next_event().await.unwrap().name(), "request_end");
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::create("test");
        drop(tx);
        assert!(source.next_event().await.is_none());
    }
}
