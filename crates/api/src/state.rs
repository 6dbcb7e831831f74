use std::sync::Arc;
use std::time::Instant;

use turbinelog_events::Notifier;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimitState;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: turbinelog_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Visit notification dispatcher.
    pub notifier: Notifier,
    /// Sliding-window admission state for the write routes.
    pub rate_limit: Arc<RateLimitState>,
    /// Process start, reported as uptime by `/health`.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pool: turbinelog_db::DbPool, config: ServerConfig, notifier: Notifier) -> Self {
        let rate_limit = Arc::new(RateLimitState::new(&config.rate_limit));
        Self {
            pool,
            config: Arc::new(config),
            notifier,
            rate_limit,
            started_at: Instant::now(),
        }
    }
}
