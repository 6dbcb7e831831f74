//! Sliding-window rate limiting for the visit write routes.
//!
//! Each `(client address, route path)` key keeps a log of the instants of
//! its admitted requests. A request is admitted while fewer than
//! `max_requests` entries fall inside the trailing window; otherwise it is
//! rejected with 429 until the oldest entry ages out. Rejected requests are
//! not logged, so hammering a closed window does not extend it.
//!
//! State is in memory and owned by [`AppState`]; it does not survive a
//! restart.
//!
//! ## Response Headers
//!
//! - `X-RateLimit-Limit` with the configured limit
//! - `X-RateLimit-Remaining` with admissions left in the current window
//! - `Retry-After` (429 only) with seconds until the oldest entry expires

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Key map size above which empty windows are swept on the next check.
const SWEEP_THRESHOLD: usize = 1024;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Identity a request is counted under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub client: String,
    pub route: String,
}

impl RateKey {
    pub fn new(client: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            route: route.into(),
        }
    }
}

/// Result of a rate limit check.
#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is admitted and has been counted.
    Allowed { limit: u32, remaining: u32 },
    /// Request is rejected.
    Limited { limit: u32, retry_after_secs: u64 },
}

/// Admission state shared across all requests.
#[derive(Debug)]
pub struct RateLimitState {
    limit: u32,
    window: Duration,
    trust_forwarded_for: bool,
    windows: Mutex<HashMap<RateKey, VecDeque<Instant>>>,
}

impl RateLimitState {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            limit: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            trust_forwarded_for: config.trust_forwarded_for,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check and count a request arriving now.
    pub async fn check(&self, key: &RateKey) -> RateLimitDecision {
        self.check_at(key, Instant::now()).await
    }

    /// Check and count a request arriving at `now`.
    pub async fn check_at(&self, key: &RateKey, now: Instant) -> RateLimitDecision {
        let mut windows = self.windows.lock().await;

        if windows.len() >= SWEEP_THRESHOLD {
            windows.retain(|_, hits| {
                expire(hits, now, self.window);
                !hits.is_empty()
            });
        }

        let hits = windows.entry(key.clone()).or_default();
        expire(hits, now, self.window);

        let used = u32::try_from(hits.len()).unwrap_or(u32::MAX);
        if used >= self.limit {
            let elapsed = hits
                .front()
                .map(|oldest| now.duration_since(*oldest))
                .unwrap_or_default();
            return RateLimitDecision::Limited {
                limit: self.limit,
                retry_after_secs: ceil_secs(self.window.saturating_sub(elapsed)).max(1),
            };
        }

        hits.push_back(now);
        RateLimitDecision::Allowed {
            limit: self.limit,
            remaining: self.limit - used - 1,
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Resolve the client address a request is counted under.
    fn client_address(&self, req: &Request<Body>) -> String {
        if self.trust_forwarded_for {
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(addr) = forwarded {
                return addr.to_string();
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Drop log entries that have aged out of the window.
fn expire(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = hits.front() {
        if now.duration_since(*oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// Rate limiting middleware for the visit write routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let limiter = &state.rate_limit;
    let key = RateKey::new(limiter.client_address(&req), req.uri().path());

    match limiter.check(&key).await {
        RateLimitDecision::Allowed { limit, remaining } => {
            let mut response = next.run(req).await;
            add_rate_limit_headers(response.headers_mut(), limit, remaining);
            response
        }
        RateLimitDecision::Limited {
            limit,
            retry_after_secs,
        } => {
            tracing::warn!(
                client = %key.client,
                route = %key.route,
                limit,
                retry_after_secs,
                "Rate limit exceeded"
            );
            let mut response = AppError::RateLimited { retry_after_secs }.into_response();
            add_rate_limit_headers(response.headers_mut(), limit, 0);
            response
        }
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(HeaderName::from_static(LIMIT_HEADER), HeaderValue::from(limit));
    headers.insert(
        HeaderName::from_static(REMAINING_HEADER),
        HeaderValue::from(remaining),
    );
}
