//! Synchronous analyze and transcribe endpoint integration tests.
//!
//! Run with: `cargo test -p earshot-api --test analysis_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;

use helpers::{auth_header, bearer_token, mp3_bytes, setup_test_app};

fn audio_form(file_name: &str, mime: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(mp3_bytes()).file_name(file_name).mime_type(mime),
    )
}

#[tokio::test]
async fn analyze_returns_timeline_and_verdict() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/analyze")
        .add_header(name, value)
        .multipart(audio_form("clip.mp3", "audio/mp3"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();

    assert_eq!(body["status"], "success");
    assert_eq!(body["overall_prediction"], "AI");
    assert_eq!(body["aggregate_confidence"], 0.8);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["timestamp"], 0);
    assert_eq!(results[1]["timestamp"], 3);
    assert_eq!(results[2]["timestamp"], 6);
    assert_eq!(results[2]["prediction"], "human");
}

#[tokio::test]
async fn analyze_rejects_unsupported_extension() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/analyze")
        .add_header(name, value)
        .multipart(audio_form("notes.txt", "text/plain"))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn analyze_requires_a_file_part() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/analyze")
        .add_header(name, value)
        .multipart(MultipartForm::new().add_text("note", "no file here"))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn transcribe_subscriber_keeps_every_word() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/transcribe")
        .add_header(name, value)
        .add_query_param("has_subscription", "true")
        .multipart(audio_form("clip.mp3", "audio/mp3"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();

    assert_eq!(body["words"].as_array().unwrap().len(), 60);
    assert!(body.get("is_limited").is_none() || body["is_limited"].is_null());
    assert!(body["text"].as_str().unwrap().starts_with("word0 word1"));
    assert_eq!(body["summary"], "A scripted transcript.");
}

#[tokio::test]
async fn transcribe_free_tier_is_truncated_to_fifty_words() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/transcribe")
        .add_header(name, value)
        .add_query_param("has_subscription", "false")
        .multipart(audio_form("clip.mp3", "audio/mp3"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();

    let words = body["words"].as_array().unwrap();
    assert_eq!(words.len(), 50);
    assert_eq!(words[49]["word"], "word49");
    assert_eq!(body["is_limited"], true);
}
