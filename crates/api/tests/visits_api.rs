//! Integration tests for the `/api/visits` endpoints.
//!
//! Drives the full router against a fresh database per test: check-in
//! normalization, the check-out guard, active lookups, same-day
//! co-activity, site blocking, and notification isolation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{
    body_json, build_app_with, get, post_json, post_raw, test_config, FailingSink, RecordingSink,
};
use serde_json::json;
use sqlx::PgPool;
use turbinelog_api::config::parse_blocked_power_plants;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn check_in(app: &axum::Router, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(app.clone(), "/api/visits/checkin", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn parse_ts(value: &serde_json::Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

// ---------------------------------------------------------------------------
// Check-in
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_in_creates_active_visit(pool: PgPool) {
    let app = common::build_test_app(pool);
    let before = Utc::now() - chrono::Duration::seconds(5);

    let json = check_in(
        &app,
        json!({
            "turbineId": "WTG-01",
            "technicians": ["Alice", "Alice", " Bob "],
            "reason": "Gearbox inspection",
            "powerPlant": "SiteA",
        }),
    )
    .await;
    let after = Utc::now() + chrono::Duration::seconds(5);

    let visit = &json["visit"];
    assert!(Uuid::parse_str(visit["id"].as_str().unwrap()).is_ok());
    assert_eq!(visit["turbineId"], "WTG-01");
    assert_eq!(visit["technicians"], json!(["Alice", "Bob"]));
    assert_eq!(visit["reason"], "Gearbox inspection");
    assert_eq!(visit["status"], "IN");
    assert!(visit["checkOut"].is_null());
    assert!(visit["comment"].is_null());

    let check_in_at = parse_ts(&visit["checkIn"]);
    assert!(check_in_at >= before && check_in_at <= after);
    assert_eq!(json["coActivity"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_in_accepts_comma_separated_technicians(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = check_in(
        &app,
        json!({ "technicians": "Carol (0612345678), Dave, ,Carol (0612345678)" }),
    )
    .await;

    assert_eq!(json["visit"]["technicians"], json!(["Carol (0612345678)", "Dave"]));
    let turbine = json["visit"]["turbineId"].as_str().unwrap();
    assert!(turbine.starts_with("UNSPECIFIED-"), "got {turbine}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_in_without_technicians_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    for body in [json!({ "turbineId": "WTG-01" }), json!({ "technicians": [" ", ""] })] {
        let response = post_json(app.clone(), "/api/visits/checkin", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"], "at least one technician name is required");
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_in_status_is_validated_and_normalized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/visits/checkin",
        json!({ "technicians": ["Alice"], "status": "present" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = check_in(&app, json!({ "technicians": ["Alice"], "status": "out" })).await;
    assert_eq!(json["visit"]["status"], "OUT");
    assert!(json["visit"]["checkOut"].is_null(), "status never closes a visit");
}

// ---------------------------------------------------------------------------
// Check-out
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_out_twice_returns_not_found_the_second_time(pool: PgPool) {
    let app = common::build_test_app(pool);
    let created = check_in(&app, json!({ "technicians": ["Alice"] })).await;
    let visit_id = created["visit"]["id"].as_str().unwrap().to_string();

    let first = post_json(app.clone(), "/api/visits/checkout", json!({ "visitId": visit_id })).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["visitId"], visit_id.as_str());
    let closed_at = parse_ts(&first["checkOut"]);

    let second = post_json(app.clone(), "/api/visits/checkout", json!({ "visitId": visit_id })).await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);

    let stored = body_json(get(app, &format!("/api/visits/{visit_id}")).await).await;
    assert_eq!(parse_ts(&stored["visit"]["checkOut"]), closed_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_and_closed_visits_are_indistinguishable(pool: PgPool) {
    let app = common::build_test_app(pool);
    let created = check_in(&app, json!({ "technicians": ["Alice"] })).await;
    let visit_id = created["visit"]["id"].as_str().unwrap().to_string();
    post_json(app.clone(), "/api/visits/checkout", json!({ "visitId": visit_id })).await;

    let closed = post_json(app.clone(), "/api/visits/checkout", json!({ "visitId": visit_id })).await;
    let unknown = post_json(
        app.clone(),
        "/api/visits/checkout",
        json!({ "visitId": Uuid::new_v4().to_string() }),
    )
    .await;

    assert_eq!(closed.status(), StatusCode::NOT_FOUND);
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(closed).await["code"], body_json(unknown).await["code"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_out_requires_visit_id(pool: PgPool) {
    let app = common::build_test_app(pool);

    let missing = post_json(app.clone(), "/api/visits/checkout", json!({})).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["error"], "visitId is required");

    let malformed = post_json(app, "/api/visits/checkout", json!({ "visitId": "abc" })).await;
    assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
}

/// Assert a 400 `BAD_REQUEST` JSON error whose message names no Rust types.
async fn assert_bad_request_json(response: axum::response::Response) {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/json"), "got {content_type}");

    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    let message = json["error"].as_str().unwrap();
    assert!(!message.is_empty());
    for internal in ["TechnicianInput", "CheckInRequest", "CheckOutRequest", "untagged", "serde"] {
        assert!(!message.contains(internal), "message leaks {internal}: {message}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_in_with_wrongly_typed_technicians_is_json_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/visits/checkin", json!({ "technicians": 42 })).await;
    assert_bad_request_json(response).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_out_with_numeric_visit_id_is_json_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/visits/checkout", json!({ "visitId": 123 })).await;
    assert_bad_request_json(response).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn body_without_content_type_is_json_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_raw(
        app,
        "/api/visits/checkin",
        None,
        r#"{"technicians":["Alice"]}"#,
    )
    .await;
    assert_bad_request_json(response).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_json_body_is_json_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_raw(app, "/api/visits/checkin", Some("application/json"), "not json").await;
    assert_bad_request_json(response).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visits")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn undecodable_query_string_is_json_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/visits/active?turbineId=WTG-01&turbineId=WTG-02").await;
    assert_bad_request_json(response).await;
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_visit_by_id(pool: PgPool) {
    let app = common::build_test_app(pool);
    let created = check_in(&app, json!({ "technicians": ["Alice"], "turbineId": "WTG-02" })).await;
    let visit_id = created["visit"]["id"].as_str().unwrap();

    let response = get(app.clone(), &format!("/api/visits/{visit_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["visit"]["turbineId"], "WTG-02");

    let missing = get(app.clone(), &format!("/api/visits/{}", Uuid::new_v4())).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let malformed = get(app, "/api/visits/not-a-uuid").await;
    assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn active_for_turbine_tracks_open_visit(pool: PgPool) {
    let app = common::build_test_app(pool);

    let none = body_json(get(app.clone(), "/api/visits/active?turbineId=WTG-03").await).await;
    assert!(none["visit"].is_null());

    let created = check_in(&app, json!({ "technicians": ["Alice"], "turbineId": "WTG-03" })).await;
    let visit_id = created["visit"]["id"].as_str().unwrap().to_string();

    let active = body_json(get(app.clone(), "/api/visits/active?turbineId=WTG-03").await).await;
    assert_eq!(active["visit"]["id"], visit_id.as_str());

    post_json(app.clone(), "/api/visits/checkout", json!({ "visitId": visit_id })).await;
    let closed = body_json(get(app.clone(), "/api/visits/active?turbineId=WTG-03").await).await;
    assert!(closed["visit"].is_null());

    let missing = get(app, "/api/visits/active").await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Co-activity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_check_in_at_site_reports_co_activity(pool: PgPool) {
    let app = common::build_test_app(pool);

    let first = check_in(&app, json!({ "technicians": ["Alice"], "powerPlant": "SiteA" })).await;
    assert_eq!(first["coActivity"], false);

    let second = check_in(&app, json!({ "technicians": ["Bob"], "powerPlant": "SiteA" })).await;
    assert_eq!(second["coActivity"], true);

    let other_site = check_in(&app, json!({ "technicians": ["Carol"], "powerPlant": "SiteB" })).await;
    assert_eq!(other_site["coActivity"], false);

    let site = body_json(get(app.clone(), "/api/visits/active-site?powerPlant=SiteA").await).await;
    assert_eq!(site["count"], 2);
    assert_eq!(site["visits"].as_array().unwrap().len(), 2);

    let missing = get(app, "/api/visits/active-site").await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn site_query_excludes_visits_checked_in_yesterday(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let created = check_in(&app, json!({ "technicians": ["Alice"], "powerPlant": "SiteC" })).await;
    let visit_id = Uuid::parse_str(created["visit"]["id"].as_str().unwrap()).unwrap();

    sqlx::query("UPDATE visits SET check_in = check_in - INTERVAL '1 day' WHERE id = $1")
        .bind(visit_id)
        .execute(&pool)
        .await
        .unwrap();

    let site = body_json(get(app.clone(), "/api/visits/active-site?powerPlant=SiteC").await).await;
    assert_eq!(site["count"], 0);

    // Still active for its turbine: the day filter only affects co-activity.
    let by_id = body_json(get(app, &format!("/api/visits/{visit_id}")).await).await;
    assert!(by_id["visit"]["checkOut"].is_null());
}

// ---------------------------------------------------------------------------
// Site blocking and notifications
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn blocked_site_rejects_check_in_without_writing(pool: PgPool) {
    let mut config = test_config();
    config.blocked_power_plants = parse_blocked_power_plants("SiteX");
    let app = build_app_with(pool.clone(), config, Arc::new(RecordingSink::default()));

    let response = post_json(
        app,
        "/api/visits/checkin",
        json!({ "technicians": ["Alice"], "powerPlant": "sitex" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "SITE_BLOCKED");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failing_notification_sink_does_not_affect_responses(pool: PgPool) {
    let app = build_app_with(pool, test_config(), Arc::new(FailingSink));

    let created = check_in(&app, json!({ "technicians": ["Alice"], "powerPlant": "SiteA" })).await;
    let visit_id = created["visit"]["id"].as_str().unwrap().to_string();

    let response = post_json(app, "/api/visits/checkout", json!({ "visitId": visit_id })).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn transitions_notify_configured_recipients(pool: PgPool) {
    let sink = Arc::new(RecordingSink::default());
    let mut config = test_config();
    config.notify_recipients = "SiteA=lead@sitea.test;OTHER=ops@turbinelog.test".into();
    let app = build_app_with(pool, config, sink.clone());

    let created = check_in(
        &app,
        json!({ "technicians": ["Alice"], "turbineId": "WTG-09", "powerPlant": "SiteA" }),
    )
    .await;
    let visit_id = created["visit"]["id"].as_str().unwrap().to_string();
    post_json(app, "/api/visits/checkout", json!({ "visitId": visit_id })).await;

    // Delivery runs on a spawned task.
    for _ in 0..50 {
        if sink.sent.lock().await.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let sent = sink.sent.lock().await;
    assert_eq!(sent.len(), 2);
    let subjects: Vec<&str> = sent.iter().map(|n| n.subject.as_str()).collect();
    assert!(subjects.contains(&"[Check-in] WTG-09 @ SiteA"));
    assert!(subjects.contains(&"[Check-out] WTG-09 @ SiteA"));
    assert!(sent.iter().all(|n| n.recipients == vec!["lead@sitea.test".to_string()]));
}
