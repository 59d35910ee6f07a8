//! Report lifecycle integration tests: signed upload, dispatch, worker
//! trigger, status projection.
//!
//! Run with: `cargo test -p earshot-api --test reports_test`

mod helpers;

use axum::body::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;

use earshot_core::constants::{QUEUE_NAME_HEADER, QUEUE_SIGNATURE_HEADER, TASK_NAME_HEADER};
use earshot_worker::HttpTaskQueue;
use helpers::{auth_header, bearer_token, mp3_bytes, setup_test_app, TEST_QUEUE_SECRET};

/// Upload a file through the signed-URL flow and return its object key.
async fn upload_file(app: &helpers::TestApp, token: &str, file_name: &str) -> String {
    let (name, value) = auth_header(token);
    let response = app
        .server
        .post("/generate-upload-url")
        .add_header(name, value)
        .json(&serde_json::json!({
            "file_name": file_name,
            "file_type": "audio/mp3",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();

    let key = body["file_name"].as_str().unwrap().to_string();
    let signed_url = body["signed_url"].as_str().unwrap();
    let path = signed_url
        .strip_prefix("http://localhost")
        .expect("signed url uses the configured base");

    let put = app
        .server
        .put(path)
        .add_header("Content-Type", "audio/mp3")
        .bytes(Bytes::from(mp3_bytes()))
        .await;
    assert_eq!(put.status_code(), 200);

    key
}

/// Deliver a dispatched task to the worker trigger the way the queue would.
async fn deliver_task(app: &helpers::TestApp, task_id: &str, key: &str) {
    let body = serde_json::to_vec(&serde_json::json!({
        "bucket_name": "earshot-uploads",
        "file_name": key,
    }))
    .unwrap();
    let signature = HttpTaskQueue::sign_body(TEST_QUEUE_SECRET.as_bytes(), &body);

    let response = app
        .server
        .post("/process-report")
        .add_header(TASK_NAME_HEADER, task_id)
        .add_header(QUEUE_NAME_HEADER, "report-processing")
        .add_header(QUEUE_SIGNATURE_HEADER, signature)
        .add_header("Content-Type", "application/json")
        .bytes(Bytes::from(body))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Poll status until the job leaves pending, up to ~2 seconds.
async fn wait_for_completion(app: &helpers::TestApp, token: &str, task_id: &str) -> Value {
    for _ in 0..100 {
        let (name, value) = auth_header(token);
        let response = app
            .server
            .get(&format!("/report-status/{}", task_id))
            .add_query_param("has_subscription", "true")
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), 200);
        let body: Value = response.json();
        if body["status"] != "pending" {
            return body;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("job never left pending");
}

#[tokio::test]
async fn full_report_lifecycle_with_tier_projection() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let key = upload_file(&app, &token, "My File!.mp3").await;

    // key is timestamp-prefixed and fully sanitized
    let (prefix, name) = key.split_once('-').unwrap();
    assert!(prefix.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(name, "My_File_.mp3");

    let (name_h, value) = auth_header(&token);
    let response = app
        .server
        .post("/report")
        .add_header(name_h, value)
        .json(&serde_json::json!({
            "bucket_name": "earshot-uploads",
            "file_name": key,
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "pending");
    let task_id = body["task_id"].as_str().unwrap().to_string();

    deliver_task(&app, &task_id, &key).await;
    let completed = wait_for_completion(&app, &token, &task_id).await;

    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["overall_prediction"], "AI");

    // summary first, then one timeline entry per chunk
    let results = completed["result"].as_array().unwrap();
    assert_eq!(results.len(), 4);
    assert!(results[0].get("summary_statistics").is_some());
    assert_eq!(results[1]["timestamp"], 0);
    assert_eq!(results[2]["timestamp"], 3);
    assert_eq!(results[3]["timestamp"], 6);

    assert!(completed["transcription_data"].is_object());
    assert!(completed.get("is_limited").is_none());

    // free view keeps the whole timeline but withholds the transcription
    let (name_h, value) = auth_header(&token);
    let free = app
        .server
        .get(&format!("/report-status/{}", task_id))
        .add_query_param("has_subscription", "false")
        .add_header(name_h, value)
        .await;
    assert_eq!(free.status_code(), 200);
    let free: Value = free.json();
    assert_eq!(free["status"], "completed");
    assert_eq!(free["result"].as_array().unwrap().len(), 4);
    assert!(free["transcription_data"].is_null());
    assert_eq!(free["is_limited"], true);
}

#[tokio::test]
async fn upload_url_decisions_are_audited_with_subject() {
    use tracing::instrument::WithSubscriber;

    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let capture = helpers::LogCapture::default();

    let (name, value) = auth_header(&token);
    let accepted = async {
        app.server
            .post("/generate-upload-url")
            .add_header(name, value)
            .json(&serde_json::json!({
                "file_name": "clip.mp3",
                "file_type": "audio/mp3",
            }))
            .await
    }
    .with_subscriber(helpers::capture_subscriber(&capture))
    .await;
    assert_eq!(accepted.status_code(), 200);

    let logs = capture.contents();
    assert!(logs.contains("upload_url_generated"));
    assert!(logs.contains("test-user"));

    let capture = helpers::LogCapture::default();
    let (name, value) = auth_header(&token);
    let rejected = async {
        app.server
            .post("/generate-upload-url")
            .add_header(name, value)
            .json(&serde_json::json!({
                "file_name": "notes.txt",
                "file_type": "text/plain",
            }))
            .await
    }
    .with_subscriber(helpers::capture_subscriber(&capture))
    .await;
    assert_eq!(rejected.status_code(), 400);

    let logs = capture.contents();
    assert!(logs.contains("invalid_file_rejected"));
    assert!(logs.contains("test-user"));
}

#[tokio::test]
async fn stale_uploads_are_rejected() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let key = upload_file(&app, &token, "old.mp3").await;
    app.storage
        .set_created_at(&key, Utc::now() - ChronoDuration::seconds(61));

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/report")
        .add_header(name, value)
        .json(&serde_json::json!({
            "bucket_name": "earshot-uploads",
            "file_name": key,
        }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "STALE_UPLOAD");
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/report")
        .add_header(name, value)
        .json(&serde_json::json!({
            "bucket_name": "earshot-uploads",
            "file_name": "never-uploaded.mp3",
        }))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn unknown_task_id_reports_pending() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .get("/report-status/not-a-real-task")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "pending");
    assert!(body["result"].is_null());
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn worker_trigger_requires_queue_headers() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post("/process-report")
        .json(&serde_json::json!({
            "bucket_name": "earshot-uploads",
            "file_name": "x.mp3",
        }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn worker_trigger_rejects_bad_signature() {
    let app = setup_test_app().await;

    let body = serde_json::to_vec(&serde_json::json!({
        "bucket_name": "earshot-uploads",
        "file_name": "x.mp3",
    }))
    .unwrap();

    let response = app
        .server
        .post("/process-report")
        .add_header(TASK_NAME_HEADER, "task-1")
        .add_header(QUEUE_NAME_HEADER, "report-processing")
        .add_header(QUEUE_SIGNATURE_HEADER, "deadbeef")
        .add_header("Content-Type", "application/json")
        .bytes(Bytes::from(body))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn upload_with_forged_grant_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .put("/storage/12345-clip.mp3")
        .add_query_param("token", "not-a-real-grant")
        .add_header("Content-Type", "audio/mp3")
        .bytes(Bytes::from(mp3_bytes()))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn grant_is_bound_to_the_declared_content_type() {
    let app = setup_test_app().await;
    let token = bearer_token(&app.server).await;

    let (name, value) = auth_header(&token);
    let response = app
        .server
        .post("/generate-upload-url")
        .add_header(name, value)
        .json(&serde_json::json!({
            "file_name": "clip.mp3",
            "file_type": "audio/mp3",
        }))
        .await;
    let body: Value = response.json();
    let path = body["signed_url"]
        .as_str()
        .unwrap()
        .strip_prefix("http://localhost")
        .unwrap()
        .to_string();

    // same grant, different content type
    let put = app
        .server
        .put(&path)
        .add_header("Content-Type", "audio/wav")
        .bytes(Bytes::from(mp3_bytes()))
        .await;
    assert_eq!(put.status_code(), 401);
}
