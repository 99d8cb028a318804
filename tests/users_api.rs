//! Router-level tests against the in-memory store.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{create, get, post_json, send};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use users_api::{app, AppState, MemoryUserStore, ServerConfig};

fn test_app() -> (Router, MemoryUserStore) {
    let store = MemoryUserStore::new();
    let state = AppState::new(Arc::new(store.clone()));
    (app(state, &ServerConfig::default()), store)
}

#[tokio::test]
async fn create_returns_201_with_server_assigned_fields() {
    let (app, store) = test_app();
    let (status, body) = send(
        &app,
        post_json(
            "/users/",
            &json!({ "id": 42, "name": "Ada", "email": "ada@example.com", "age": 36 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1, "client-supplied id is ignored");
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["age"], 36);
    assert!(body["created_at"].is_string());
    assert!(body["updated_at"].is_null());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn age_is_optional() {
    let (app, _) = test_app();
    let (status, body) = create(&app, "Grace", "grace@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["age"].is_null());
}

#[tokio::test]
async fn duplicate_email_is_rejected_and_stored_once() {
    let (app, store) = test_app();
    let (first, _) = create(&app, "Ada", "ada@example.com").await;
    let (second, body) = create(&app, "Someone Else", "ada@example.com").await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "conflict");
    assert_eq!(body["error"]["message"], "Email already registered");
    assert_eq!(store.count_email("ada@example.com").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_creates_have_one_winner() {
    let (app, store) = test_app();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { create(&app, &format!("racer {i}"), "race@example.com").await.0 })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::BAD_REQUEST).count(), 7);
    assert_eq!(store.count_email("race@example.com").await, 1);
}

#[tokio::test]
async fn missing_email_is_rejected_before_storage() {
    let (app, store) = test_app();
    let (status, body) = send(&app, post_json("/users/", &json!({ "name": "Ada" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn invalid_fields_are_rejected_before_storage() {
    let (app, store) = test_app();
    let cases = [
        json!({ "name": "Ada", "email": "not-an-email" }),
        json!({ "name": "", "email": "ada@example.com" }),
        json!({ "name": "x".repeat(51), "email": "ada@example.com" }),
        json!({ "name": "Ada", "email": "ada@example.com", "age": -3 }),
        json!({ "name": "Ada", "email": "ada@example.com", "age": "old" }),
    ];
    for case in &cases {
        let (status, _) = send(&app, post_json("/users/", case)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{case}");
    }
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let (app, store) = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/users/")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn get_existing_user() {
    let (app, _) = test_app();
    let (_, created) = create(&app, "Ada", "ada@example.com").await;
    let (status, body) = send(&app, get(&format!("/users/{}", created["id"]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn get_missing_user_is_404() {
    let (app, _) = test_app();
    let (status, body) = send(&app, get("/users/999999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "User not found");
}

#[tokio::test]
async fn non_integer_id_is_422() {
    let (app, _) = test_app();
    let (status, _) = send(&app, get("/users/abc")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_pages_through_users_in_id_order() {
    let (app, _) = test_app();
    for i in 0..15 {
        let (status, _) = create(&app, &format!("user {i}"), &format!("user{i}@example.com")).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = send(&app, get("/users/?skip=0&limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    let first_ids: Vec<i64> = first.as_array().unwrap().iter().map(|u| u["id"].as_i64().unwrap()).collect();
    assert_eq!(first_ids, (1..=10).collect::<Vec<_>>());

    let (status, rest) = send(&app, get("/users/?skip=10&limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    let rest_ids: Vec<i64> = rest.as_array().unwrap().iter().map(|u| u["id"].as_i64().unwrap()).collect();
    assert_eq!(rest_ids, (11..=15).collect::<Vec<_>>());

    let (_, defaults) = send(&app, get("/users")).await;
    assert_eq!(defaults.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn skip_past_end_is_empty_200() {
    let (app, _) = test_app();
    create(&app, "Ada", "ada@example.com").await;
    let (status, body) = send(&app, get("/users/?skip=100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn bad_paging_params_are_422() {
    let (app, _) = test_app();
    for uri in ["/users/?skip=-1", "/users/?limit=0", "/users/?limit=abc"] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
    }
}

#[tokio::test]
async fn every_request_releases_its_session() {
    let (app, store) = test_app();
    create(&app, "Ada", "ada@example.com").await;
    create(&app, "Ada", "ada@example.com").await;
    send(&app, post_json("/users/", &json!({ "name": "Ada" }))).await;
    send(&app, get("/users/1")).await;
    send(&app, get("/users/999")).await;
    send(&app, get("/users/?skip=-5")).await;
    send(&app, get("/users/")).await;
    assert_eq!(store.open_sessions(), 0);
}

#[tokio::test]
async fn health_ready_and_version() {
    let (app, _) = test_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    let (_, body) = send(&app, get("/version")).await;
    assert_eq!(body["name"], "users-api");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn responses_carry_request_id_and_process_time() {
    let (app, _) = test_app();
    let response = app.oneshot(get("/users/999")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-process-time"));
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin_only() {
    let (app, _) = test_app();
    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/users/")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app.clone().oneshot(preflight("http://localhost:8080")).await.unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://localhost:8080"
    );
    assert_eq!(allowed.headers()["access-control-allow-credentials"], "true");

    let denied = app.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(!denied.headers().contains_key("access-control-allow-origin"));
}
