use std::time::Duration;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use turbinelog_db::DbPool;

use crate::state::AppState;

/// Upper bound on the database round trip made by `/health`.
const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `true` while the process serves requests.
    pub ok: bool,
    /// Seconds since the server started.
    pub uptime: f64,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database answered within [`DB_CHECK_TIMEOUT`].
    pub db_healthy: bool,
}

/// GET /health -- liveness, uptime, and database reachability.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = database_reachable(&state.pool, DB_CHECK_TIMEOUT).await;

    Json(HealthResponse {
        ok: true,
        uptime: state.started_at.elapsed().as_secs_f64(),
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// A stalled database counts as unhealthy once `limit` elapses.
async fn database_reachable(pool: &DbPool, limit: Duration) -> bool {
    match tokio::time::timeout(limit, turbinelog_db::health_check(pool)).await {
        Ok(result) => result.is_ok(),
        Err(_) => {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, "Database health check timed out");
            false
        }
    }
}

/// Mount health check routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
