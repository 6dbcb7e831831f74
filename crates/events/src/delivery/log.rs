//! Sink used when no SMTP server is configured.

use async_trait::async_trait;

use crate::sink::{Notification, NotificationSink, NotifyError};

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            subject = %notification.subject,
            recipients = ?notification.recipients,
            "SMTP not configured, notification logged only"
        );
        Ok(())
    }
}
