//! Application setup and initialization
//!
//! Initialization logic lives here rather than in main.rs so integration
//! tests can assemble the same router over in-memory backends.

pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use std::sync::Arc;

use earshot_analysis::{
    AudioAnalyzer, AudioValidator, HttpAudioAnalyzer, HttpTranscriptionProvider,
    TranscriptionProvider,
};
use earshot_core::Config;
use earshot_storage::{LocalObjectStore, ObjectStore};
use earshot_worker::{HttpTaskQueue, JobStore, ReportProcessor, TaskQueue};

use crate::auth::TokenService;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::{ChatModel, HttpChatModel};
use crate::state::AppState;

/// Initialize the entire application: backends from config, then the router.
pub async fn initialize_app(config: Config) -> Result<(AppState, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    let storage: Arc<dyn ObjectStore> = Arc::new(
        LocalObjectStore::new(
            config.local_storage_path.clone(),
            config.local_storage_base_url.clone(),
            config.auth_secret.clone().into_bytes(),
        )
        .await?,
    );

    let queue: Arc<dyn TaskQueue> = Arc::new(HttpTaskQueue::new(
        config.worker_base_url.clone(),
        config.queue_name.clone(),
        config
            .queue_shared_secret
            .clone()
            .map(String::into_bytes),
    )?);

    let analyzer: Option<Arc<dyn AudioAnalyzer>> = config
        .analyzer_url
        .clone()
        .map(|url| Arc::new(HttpAudioAnalyzer::new(url)) as Arc<dyn AudioAnalyzer>);

    let transcriber: Option<Arc<dyn TranscriptionProvider>> =
        config.transcription_api_key.clone().map(|key| {
            Arc::new(HttpTranscriptionProvider::new(
                config.transcription_api_url.clone(),
                key,
            )) as Arc<dyn TranscriptionProvider>
        });

    let chat: Option<Arc<dyn ChatModel>> = config.chat_api_key.clone().map(|key| {
        Arc::new(HttpChatModel::new(
            config.chat_api_url.clone(),
            key,
            config.chat_model.clone(),
        )) as Arc<dyn ChatModel>
    });

    let state = build_state(config, storage, queue, analyzer, transcriber, chat);
    let router = routes::build_router(state.clone())?;

    tracing::info!(
        analyzer_configured = state.analyzer.is_some(),
        transcriber_configured = state.transcriber.is_some(),
        chat_configured = state.chat.is_some(),
        "Application initialized"
    );

    Ok((state, router))
}

/// Assemble shared state from backends. Tests call this with in-memory
/// doubles instead of the real HTTP clients.
pub fn build_state(
    config: Config,
    storage: Arc<dyn ObjectStore>,
    queue: Arc<dyn TaskQueue>,
    analyzer: Option<Arc<dyn AudioAnalyzer>>,
    transcriber: Option<Arc<dyn TranscriptionProvider>>,
    chat: Option<Arc<dyn ChatModel>>,
) -> AppState {
    let jobs = JobStore::new();
    let tokens = Arc::new(TokenService::new(
        config.auth_secret.clone().into_bytes(),
        config.token_ttl_secs,
    ));

    let processor = analyzer.clone().map(|analyzer| {
        Arc::new(ReportProcessor::new(
            storage.clone(),
            analyzer,
            transcriber.clone(),
            jobs.clone(),
        ))
    });

    AppState {
        token_rate_limiter: Arc::new(RateLimiter::new(config.token_rate_limit_per_minute)),
        analyze_rate_limiter: Arc::new(RateLimiter::new(config.analyze_rate_limit_per_minute)),
        transcribe_rate_limiter: Arc::new(RateLimiter::new(config.transcribe_rate_limit_per_minute)),
        chat_rate_limiter: Arc::new(RateLimiter::new(config.chat_rate_limit_per_minute)),
        config: Arc::new(config),
        storage,
        queue,
        jobs,
        tokens,
        validator: Arc::new(AudioValidator::with_defaults()),
        analyzer,
        transcriber,
        chat,
        processor,
    }
}
