//! Visit notification infrastructure.
//!
//! - [`NotificationSink`] -- delivery capability for composed notifications.
//! - [`delivery`] -- SMTP and log-only sinks.
//! - [`RecipientDirectory`] -- power plant to recipient address routing.
//! - [`message`] -- subject/body composition for check-in and check-out.
//! - [`Notifier`] -- fire-and-forget dispatch used by the API after a
//!   successful state transition.

pub mod delivery;
pub mod message;
pub mod notifier;
pub mod recipients;
pub mod sink;

pub use delivery::email::{EmailConfig, EmailSink};
pub use delivery::log::LogSink;
pub use notifier::Notifier;
pub use recipients::RecipientDirectory;
pub use sink::{Notification, NotificationSink, NotifyError};
