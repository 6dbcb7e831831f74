//! Concrete [`NotificationSink`](crate::NotificationSink) implementations.

pub mod email;
pub mod log;
