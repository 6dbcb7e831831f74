//! Wiring of the notification sink from configuration.
//!
//! SMTP delivery is used when `SMTP_HOST` is set; otherwise notifications
//! are only logged.

use std::sync::Arc;

use turbinelog_events::recipients::RecipientParseError;
use turbinelog_events::{
    EmailConfig, EmailSink, LogSink, NotificationSink, Notifier, NotifyError, RecipientDirectory,
};

use crate::config::ServerConfig;

#[derive(Debug, thiserror::Error)]
pub enum NotifierSetupError {
    #[error("Invalid NOTIFY_RECIPIENTS: {0}")]
    Recipients(#[from] RecipientParseError),

    #[error("Invalid SMTP configuration: {0}")]
    Smtp(#[from] NotifyError),
}

/// Build the [`Notifier`] from server and SMTP configuration.
pub fn build_notifier(
    config: &ServerConfig,
    email: Option<EmailConfig>,
) -> Result<Notifier, NotifierSetupError> {
    let recipients = RecipientDirectory::parse(&config.notify_recipients)?;
    if recipients.is_empty() {
        tracing::warn!("NOTIFY_RECIPIENTS is empty, visit notifications are disabled");
    }

    let sink: Arc<dyn NotificationSink> = match email {
        Some(email) => {
            tracing::info!(host = %email.smtp_host, port = email.smtp_port, "SMTP notifications enabled");
            Arc::new(EmailSink::new(&email)?)
        }
        None => {
            tracing::info!("SMTP_HOST not set, notifications will be logged only");
            Arc::new(LogSink)
        }
    };

    Ok(Notifier::new(sink, recipients))
}
