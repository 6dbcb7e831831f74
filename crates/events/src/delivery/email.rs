//! Email notification delivery via SMTP.
//!
//! [`EmailSink`] wraps the `lettre` async SMTP transport to send plain-text
//! visit notifications. Configuration is loaded from environment variables;
//! if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns `None` and the
//! caller falls back to [`LogSink`](crate::LogSink).

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::sink::{Notification, NotificationSink, NotifyError};

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@turbinelog.local";

/// Configuration for the SMTP sink.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set. Panics on an unparsable
    /// `SMTP_PORT`, like the server's own startup configuration.
    ///
    /// | Variable        | Required | Default                     |
    /// |-----------------|----------|-----------------------------|
    /// | `SMTP_HOST`     | yes      | none                        |
    /// | `SMTP_PORT`     | no       | `587`                       |
    /// | `SMTP_FROM`     | no       | `noreply@turbinelog.local`  |
    /// | `SMTP_USER`     | no       | none                        |
    /// | `SMTP_PASSWORD` | no       | none                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty())?;
        Some(Self {
            smtp_host,
            smtp_port: parse_smtp_port(std::env::var("SMTP_PORT").ok().as_deref()),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Blank or unset falls back to [`DEFAULT_SMTP_PORT`].
fn parse_smtp_port(raw: Option<&str>) -> u16 {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => p.parse().expect("SMTP_PORT must be a valid u16"),
        None => DEFAULT_SMTP_PORT,
    }
}

// ---------------------------------------------------------------------------
// EmailSink
// ---------------------------------------------------------------------------

/// Sends visit notifications as a single plain-text email per event.
pub struct EmailSink {
    from: Mailbox,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSink {
    /// Build the SMTP transport. Fails if the sender address or relay host
    /// is invalid; no connection is opened until the first send.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config.from_address.parse()?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            from,
            mailer: transport_builder.build(),
        })
    }
}

/// Assemble the MIME message with every recipient in `To`.
fn build_message(from: &Mailbox, notification: &Notification) -> Result<Message, NotifyError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(notification.subject.as_str())
        .header(ContentType::TEXT_PLAIN);

    for recipient in &notification.recipients {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    builder
        .body(notification.body.clone())
        .map_err(|e| NotifyError::Build(e.to_string()))
}

#[async_trait]
impl NotificationSink for EmailSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = build_message(&self.from, notification)?;
        self.mailer.send(email).await?;

        tracing::info!(
            recipients = notification.recipients.len(),
            subject = %notification.subject,
            "Notification email sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
