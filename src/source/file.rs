//! File-based event source.
//!
//! Replays a newline-delimited JSON event file, optionally following it as
//! it grows.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwatch_types::Event;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use super::{parse_line, EventSource};

/// An event source that reads events from a file.
///
/// Malformed lines are skipped; the most recent one is reported by
/// [`error`](EventSource::error). Without [`follow`](Self::follow) the source
/// ends at end of file. With it, the source waits for more lines to be
/// appended, like `tail -f`.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    reader: Option<BufReader<File>>,
    follow: Option<Duration>,
    /// Bytes of the line being assembled. Kept across calls so a cancelled
    /// read or a line arriving in pieces loses nothing.
    partial: Vec<u8>,
    line_no: usize,
    last_error: Option<String>,
    done: bool,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            reader: None,
            follow: None,
            partial: Vec::new(),
            line_no: 0,
            last_error: None,
            done: false,
        }
    }

    /// Keep waiting for appended lines at end of file, checking every
    /// `interval`.
    pub fn follow(mut self, interval: Duration) -> Self {
        self.follow = Some(interval);
        self
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fail(&mut self, message: String) -> Option<Event> {
        warn!(source = %self.description, error = %message, "Event file unreadable");
        self.last_error = Some(message);
        self.done = true;
        None
    }
}

#[async_trait]
impl EventSource for FileSource {
    async fn next_event(&mut self) -> Option<Event> {
        loop {
            if self.done {
                return None;
            }

            if self.reader.is_none() {
                match File::open(&self.path).await {
                    Ok(file) => self.reader = Some(BufReader::new(file)),
                    Err(e) => return self.fail(format!("Read error: {}", e)),
                }
            }
            let reader = self.reader.as_mut()?;

            match reader.read_until(b'\n', &mut self.partial).await {
                Ok(0) => match self.follow {
                    Some(interval) => tokio::time::sleep(interval).await,
                    None => {
                        debug!(source = %self.description, lines = self.line_no, "End of event file");
                        self.done = true;
                        return None;
                    }
                },
                Ok(_) => {
                    if self.follow.is_some() && self.partial.last() != Some(&b'\n') {
                        continue;
                    }
                    self.line_no += 1;
                    let bytes = std::mem::take(&mut self.partial);
                    let line = match String::from_utf8(bytes) {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(source = %self.description, line = self.line_no, "Skipping non UTF-8 line");
                            self.last_error =
                                Some(format!("Parse error on line {}: {}", self.line_no, e));
                            continue;
                        }
                    };
                    match parse_line(&line) {
                        Ok(Some(event)) => return Some(event),
                        Ok(None) => {}
                        Err(e) => {
                            warn!(source = %self.description, line = self.line_no, error = %e, "Skipping malformed event");
                            self.last_error =
                                Some(format!("Parse error on line {}: {}", self.line_no, e));
                        }
                    }
                }
                Err(e) => return self.fail(format!("Read error: {}", e)),
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}
