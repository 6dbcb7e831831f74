//! Fire-and-forget dispatch of visit notifications.
//!
//! [`Notifier::dispatch`] composes the message, resolves recipients, and
//! hands delivery to a spawned task. Delivery errors are logged and dropped;
//! nothing is retried and the triggering request never observes them.

use std::sync::Arc;

use tokio::task::JoinHandle;
use turbinelog_db::models::visit::Visit;

use crate::message::{self, VisitEvent};
use crate::recipients::RecipientDirectory;
use crate::sink::{Notification, NotificationSink};

/// Shared handle for sending visit notifications. Cheap to clone.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    recipients: Arc<RecipientDirectory>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, recipients: RecipientDirectory) -> Self {
        Self {
            sink,
            recipients: Arc::new(recipients),
        }
    }

    /// Build the notification for a visit, or `None` when nobody is
    /// configured to receive it.
    pub fn compose(&self, event: VisitEvent, visit: &Visit) -> Option<Notification> {
        let recipients = self.recipients.resolve(visit.power_plant.as_deref());
        if recipients.is_empty() {
            return None;
        }
        Some(Notification {
            subject: message::subject(event, visit),
            body: message::body(event, visit),
            recipients: recipients.to_vec(),
        })
    }

    /// Deliver in the background. Returns the task handle so tests can wait
    /// on it; production callers drop it.
    pub fn dispatch(&self, event: VisitEvent, visit: &Visit) -> Option<JoinHandle<()>> {
        let Some(notification) = self.compose(event, visit) else {
            tracing::debug!(
                visit_id = %visit.id,
                power_plant = ?visit.power_plant,
                "No notification recipients configured, skipping"
            );
            return None;
        };

        let sink = Arc::clone(&self.sink);
        let visit_id = visit.id;
        Some(tokio::spawn(async move {
            if let Err(e) = sink.send(&notification).await {
                tracing::warn!(
                    error = %e,
                    %visit_id,
                    subject = %notification.subject,
                    "Visit notification delivery failed"
                );
            }
        }))
    }
}
