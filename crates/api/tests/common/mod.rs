#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tower::ServiceExt;

use turbinelog_api::config::{RateLimitConfig, ServerConfig};
use turbinelog_api::router::build_app_router;
use turbinelog_api::state::AppState;
use turbinelog_events::{Notification, NotificationSink, Notifier, NotifyError, RecipientDirectory};

/// Build a test `ServerConfig` with safe defaults.
///
/// Rate limiting keeps the production ceiling but trusts `X-Forwarded-For`
/// so tests can act as distinct clients.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 5,
        rate_limit: RateLimitConfig {
            trust_forwarded_for: true,
            ..RateLimitConfig::default()
        },
        blocked_power_plants: Default::default(),
        notify_recipients: "OTHER=ops@turbinelog.test".to_string(),
    }
}

/// Sink that records every notification it is handed.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

/// Sink that fails every delivery.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Build("smtp unavailable".into()))
    }
}

/// Build the full application router with the given config and sink.
pub fn build_app_with(pool: PgPool, config: ServerConfig, sink: Arc<dyn NotificationSink>) -> Router {
    let recipients = RecipientDirectory::parse(&config.notify_recipients).unwrap();
    let notifier = Notifier::new(sink, recipients);
    build_app_router(AppState::new(pool, config, notifier))
}

/// Build the full application router with default test config and a
/// recording sink.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_with(pool, test_config(), Arc::new(RecordingSink::default()))
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_json_from(app, uri, body, "203.0.113.1").await
}

/// POST a JSON body as if sent by `client` (via `X-Forwarded-For`).
pub async fn post_json_from(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    client: &str,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a raw body, optionally without a `Content-Type` header.
pub async fn post_raw(app: Router, uri: &str, content_type: Option<&str>, body: &str) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.1");
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
