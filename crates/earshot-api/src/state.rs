use std::sync::Arc;

use earshot_analysis::{AudioAnalyzer, AudioValidator, TranscriptionProvider};
use earshot_core::Config;
use earshot_storage::ObjectStore;
use earshot_worker::{JobStore, ReportProcessor, TaskQueue};

use crate::auth::TokenService;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::ChatModel;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn ObjectStore>,
    pub queue: Arc<dyn TaskQueue>,
    pub jobs: JobStore,
    pub tokens: Arc<TokenService>,
    pub validator: Arc<AudioValidator>,
    pub analyzer: Option<Arc<dyn AudioAnalyzer>>,
    pub transcriber: Option<Arc<dyn TranscriptionProvider>>,
    pub chat: Option<Arc<dyn ChatModel>>,
    /// Absent when no analyzer service is configured; report processing is
    /// rejected in that case.
    pub processor: Option<Arc<ReportProcessor>>,
    pub token_rate_limiter: Arc<RateLimiter>,
    pub analyze_rate_limiter: Arc<RateLimiter>,
    pub transcribe_rate_limiter: Arc<RateLimiter>,
    pub chat_rate_limiter: Arc<RateLimiter>,
}
