//! Token issuance and bearer auth integration tests.
//!
//! Run with: `cargo test -p earshot-api --test auth_test`

mod helpers;

use serde_json::Value;

use helpers::setup_test_app;

#[tokio::test]
async fn token_issued_without_a_body() {
    let app = setup_test_app().await;

    let response = app.server.post("/auth/token").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["expires_in"], 3600);
}

#[tokio::test]
async fn token_accepts_caller_supplied_subject() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/auth/token")
        .json(&serde_json::json!({ "app_user_id": "user-abc" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn protected_route_rejects_missing_header() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/report")
        .json(&serde_json::json!({
            "bucket_name": "earshot-uploads",
            "file_name": "x.mp3",
        }))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn protected_route_rejects_non_bearer_scheme() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get("/report-status/some-task")
        .add_header("Authorization", "Basic dXNlcjpwYXNz")
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn protected_route_rejects_garbage_token() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get("/report-status/some-task")
        .add_header("Authorization", "Bearer not-a-token")
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn protected_route_rejects_tampered_token() {
    let app = setup_test_app().await;
    let token = helpers::bearer_token(&app.server).await;

    // flip a character inside the base64 payload
    let mut tampered = token.clone();
    let mid = tampered.len() / 2;
    let replacement = if &tampered[mid..mid + 1] == "A" { "B" } else { "A" };
    tampered.replace_range(mid..mid + 1, replacement);

    let response = app
        .server
        .get("/report-status/some-task")
        .add_header("Authorization", format!("Bearer {}", tampered))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn health_is_open_without_auth() {
    let app = setup_test_app().await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = setup_test_app().await;

    let response = app.server.get("/health").await;
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
