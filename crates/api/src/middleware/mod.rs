//! Request admission middleware.
//!
//! - [`rate_limit`] -- per-client, per-route sliding-window request ceiling.

pub mod rate_limit;
