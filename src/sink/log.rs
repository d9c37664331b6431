use async_trait::async_trait;
use tracing::info;

use super::{Notification, NotificationSink};
use crate::error::SinkError;

/// Emits each notification as an `info` log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), SinkError> {
        info!(
            id = %notification.id,
            host = %notification.hostname,
            duration_secs = notification.duration_secs,
            "{}: {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}
