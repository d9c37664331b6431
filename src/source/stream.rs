//! Stream-based event source.
//!
//! Receives events from an async byte stream such as a TCP connection or
//! stdin.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwatch_types::Event;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{parse_line, EventSource};

/// An event source fed by a background reader task.
///
/// The task reads newline-delimited JSON from the provided async reader and
/// forwards parsed events. Malformed lines are skipped and recorded as the
/// last error. The source is exhausted once the stream closes.
///
/// # Example with a byte stream
///
/// ```
/// use std::io::Cursor;
/// use reqwatch::{EventSource, StreamSource};
///
/// # tokio_test::block_on(async {
/// let data = b"{\"type\":\"play_test_sound\"}\n";
/// let stream = Cursor::new(data.to_vec());
/// let mut source = StreamSource::spawn(stream, "example");
/// assert!(source.next_event().await.is_some());
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<Event>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!(source = %desc, "Event stream closed");
                        break;
                    }
                    Ok(_) => match parse_line(&line) {
                        Ok(Some(event)) => {
                            if tx.send(event).await.is_err() {
                                // Receiver dropped
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(source = %desc, error = %e, "Skipping malformed event");
                            *error_handle.lock() = Some(format!("Parse error: {}", e));
                        }
                    },
                    Err(e) => {
                        warn!(source = %desc, error = %e, "Event stream failed");
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error,
        }
    }

    /// Connect to a TCP endpoint that streams events.
    pub async fn connect<A>(addr: A, description: &str) -> std::io::Result<Self>
    where
        A: ToSocketAddrs,
    {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::spawn(stream, description))
    }

    /// Read events from the process's standard input.
    pub fn stdin() -> Self {
        Self::spawn(tokio::io::stdin(), "stdin")
    }

    /// Create a StreamSource from a channel of raw JSON messages, one event
    /// per message.
    ///
    /// This is useful when events arrive framed by another transport (a
    /// message bus, a websocket) rather than as a byte stream.
    pub fn from_bytes_channel(mut rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        let (tx, event_rx) = mpsc::channel(64);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        tokio::spawn(async move {
            while let Some(bytes) = rx.recv().await {
                match serde_json::from_slice::<Event>(&bytes) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        *error_handle.lock() = Some(format!("Parse error: {}", e));
                    }
                }
            }
        });

        Self {
            receiver: event_rx,
            description: format!("stream: {}", description),
            last_error,
        }
    }
}

#[async_trait]
impl EventSource for StreamSource {
    async fn next_event(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}
