//! Test helpers: build the router over in-memory backends and scripted
//! service doubles.
//!
//! Run with: `cargo test -p earshot-api`

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use std::sync::Arc;
use uuid::Uuid;

use earshot_analysis::{
    AnalysisError, AnalysisOutcome, AudioAnalyzer, ProviderResponse, TranscriptionFault,
    TranscriptionProvider,
};
use earshot_api::services::{ChatError, ChatModel};
use earshot_api::setup::{build_state, routes};
use earshot_api::state::AppState;
use earshot_core::models::ProcessReportRequest;
use earshot_core::Config;
use earshot_storage::{MemoryObjectStore, ObjectStore};
use earshot_worker::{QueueError, TaskQueue};

pub const TEST_AUTH_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_QUEUE_SECRET: &str = "queue-secret-0123456789";

/// Valid-looking MP3 payload: ID3 header plus filler.
pub fn mp3_bytes() -> Vec<u8> {
    let mut data = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
    data.extend(std::iter::repeat(0xAAu8).take(256));
    data
}

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        auth_secret: TEST_AUTH_SECRET.to_string(),
        token_ttl_secs: 3600,
        storage_bucket: "earshot-uploads".to_string(),
        local_storage_path: "./storage".to_string(),
        local_storage_base_url: "http://localhost".to_string(),
        worker_base_url: "http://localhost".to_string(),
        queue_shared_secret: Some(TEST_QUEUE_SECRET.to_string()),
        queue_name: "report-processing".to_string(),
        analyzer_url: None,
        transcription_api_key: None,
        transcription_api_url: "http://localhost/listen".to_string(),
        chat_api_key: None,
        chat_api_url: "http://localhost/models".to_string(),
        chat_model: "test-model".to_string(),
        token_rate_limit_per_minute: 100,
        analyze_rate_limit_per_minute: 100,
        transcribe_rate_limit_per_minute: 100,
        chat_rate_limit_per_minute: 100,
    }
}

/// Queue double: assigns ids without delivering. Tests drive the worker
/// trigger themselves via `/process-report`.
pub struct InertQueue;

#[async_trait]
impl TaskQueue for InertQueue {
    async fn dispatch(&self, _payload: ProcessReportRequest) -> Result<String, QueueError> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Analyzer double returning a fixed three-chunk outcome.
pub struct ScriptedAnalyzer {
    pub fail: bool,
}

#[async_trait]
impl AudioAnalyzer for ScriptedAnalyzer {
    async fn analyze(
        &self,
        _audio: &[u8],
        _filename: &str,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if self.fail {
            return Err(AnalysisError::Service("scripted failure".to_string()));
        }
        Ok(AnalysisOutcome {
            total_chunks: 3,
            ai_chunks: 2,
            human_chunks: 1,
            percent_ai: 66.7,
            percent_human: 33.3,
            predictions: vec!["AI".into(), "AI".into(), "human".into()],
            confidences: vec![0.9, 0.8, 0.7],
            overall_prediction: "AI".into(),
            aggregate_confidence: 0.8,
        })
    }
}

/// Transcriber double returning a channel response with a configurable word count.
pub struct ScriptedTranscriber {
    pub word_count: usize,
}

#[async_trait]
impl TranscriptionProvider for ScriptedTranscriber {
    async fn transcribe(
        &self,
        _audio: &[u8],
        _content_type: &str,
    ) -> Result<ProviderResponse, TranscriptionFault> {
        let words: Vec<serde_json::Value> = (0..self.word_count)
            .map(|i| {
                serde_json::json!({
                    "word": format!("word{}", i),
                    "start": i as f64 * 0.5,
                    "end": i as f64 * 0.5 + 0.4,
                    "confidence": 0.95,
                })
            })
            .collect();
        let transcript = (0..self.word_count)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");

        Ok(ProviderResponse::Raw(serde_json::json!({
            "results": {
                "channels": [{
                    "alternatives": [{ "transcript": transcript, "words": words }]
                }],
                "summary": { "short": "A scripted transcript." }
            }
        })))
    }
}

/// Chat double echoing a fixed reply.
pub struct ScriptedChat;

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        Ok("scripted reply".to_string())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<MemoryObjectStore>,
    pub state: AppState,
}

pub async fn setup_test_app() -> TestApp {
    let config = test_config();

    let storage = Arc::new(MemoryObjectStore::new(
        config.local_storage_base_url.clone(),
        config.auth_secret.clone().into_bytes(),
    ));

    let state = build_state(
        config,
        storage.clone() as Arc<dyn ObjectStore>,
        Arc::new(InertQueue),
        Some(Arc::new(ScriptedAnalyzer { fail: false })),
        Some(Arc::new(ScriptedTranscriber { word_count: 60 })),
        Some(Arc::new(ScriptedChat)),
    );

    let router = routes::build_router(state.clone()).expect("router builds");
    let server = TestServer::new(router).expect("test server starts");

    TestApp {
        server,
        storage,
        state,
    }
}

/// Obtain a bearer token through the public endpoint.
pub async fn bearer_token(server: &TestServer) -> String {
    let response = server
        .post("/auth/token")
        .json(&serde_json::json!({ "app_user_id": "test-user" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    body["token"].as_str().expect("token in response").to_string()
}

pub fn auth_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Collects formatted log output so tests can assert on emitted events.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<std::sync::Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Subscriber writing into the given capture, for scoping around one request.
pub fn capture_subscriber(capture: &LogCapture) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_max_level(tracing::Level::INFO)
        .finish()
}
