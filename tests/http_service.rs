//! HTTP service behaviour exercised through the axum router without a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use realm::config::ServerConfig;
use realm::game::interpreter::FixedClock;
use realm::game::GameStoreBuilder;
use realm::server::{router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(now: chrono::DateTime<Utc>) -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let store = GameStoreBuilder::new(dir.path().join("saves"))
        .without_flush()
        .open()
        .unwrap();
    let state = AppState {
        store: Arc::new(store),
        clock: Arc::new(FixedClock(now)),
    };
    (dir, router(state, &ServerConfig::default()))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let (_dir, app) = app(Utc::now());
    let snapshot = json!({"player": {"level": 2, "inventory": ["shining_stone"]}});

    let (status, body) = post(
        &app,
        "/api/game/save",
        json!({"userId": "u-1", "gameState": snapshot}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Game state saved."}));

    let (status, body) = post(&app, "/api/game/load", json!({"userId": "u-1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gameState"], snapshot);
}

#[tokio::test]
async fn load_of_unknown_user_is_404() {
    let (_dir, app) = app(Utc::now());
    let (status, body) = post(&app, "/api/game/load", json!({"userId": "ghost"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "No game state found."}));
}

#[tokio::test]
async fn offline_calculation_uses_two_decimals() {
    let now = Utc::now();
    let (_dir, app) = app(now);
    let last = (now - Duration::seconds(3600)).timestamp_millis();
    let (status, body) = post(
        &app,
        "/api/exp/calculateOffline",
        json!({"lastOnlineTimestamp": last, "offlineExpRate": 0.1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gainedExp"], "360.00");
    assert_eq!(body["percentage"], 100.0);
}

#[tokio::test]
async fn fractional_timestamp_is_accepted() {
    let now = Utc::now();
    let (_dir, app) = app(now);
    let last = (now - Duration::seconds(3600)).timestamp_millis() as f64 + 0.5;
    let (status, body) = post(
        &app,
        "/api/exp/calculateOffline",
        json!({"lastOnlineTimestamp": last, "offlineExpRate": 0.1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gainedExp"], "360.00");
}

#[tokio::test]
async fn future_timestamp_earns_nothing() {
    let now = Utc::now();
    let (_dir, app) = app(now);
    let later = (now + Duration::seconds(60)).timestamp_millis();
    let (_, body) = post(
        &app,
        "/api/exp/calculateOffline",
        json!({"lastOnlineTimestamp": later, "offlineExpRate": 0.1}),
    )
    .await;
    assert_eq!(body["gainedExp"], "0.00");
}

#[tokio::test]
async fn unknown_route_and_wrong_method_are_404() {
    let (_dir, app) = app(Utc::now());
    let (status, body) = post(&app, "/api/nothing", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Endpoint not found."}));

    let req = Request::builder()
        .method(Method::GET)
        .uri("/api/game/save")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Endpoint not found.");
}

#[tokio::test]
async fn malformed_body_is_400() {
    let (_dir, app) = app(Utc::now());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/game/save")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&app, "/api/game/load", json!({"user": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/exp/calculateOffline",
        json!({"lastOnlineTimestamp": 0, "offlineExpRate": -1.0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn preflight_gets_cors_headers() {
    let (_dir, app) = app(Utc::now());
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/game/save")
        .header(header::ORIGIN, "http://example.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn bare_options_is_answered_without_a_body() {
    let (_dir, app) = app(Utc::now());
    for uri in ["/api/game/load", "/api/unknown"] {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert!(status.is_success(), "{} answered {}", uri, status);
        assert_eq!(body, Value::Null);
    }
}
