//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use earshot_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Earshot API",
        version = "0.1.0",
        description = "AI-generated speech detection API. Upload audio through short-lived signed URLs, dispatch asynchronous analysis, and poll for tier-projected results. Includes synchronous analysis and transcription endpoints and a chat assistant for discussing reports."
    ),
    paths(
        handlers::health::health,
        handlers::auth_token::issue_token,
        handlers::upload_url::generate_upload_url,
        handlers::storage_put::put_object,
        handlers::analyze::analyze,
        handlers::transcribe::transcribe,
        handlers::report::dispatch_report,
        handlers::report_status::report_status,
        handlers::process_report::process_report,
        handlers::chat::chat,
        handlers::chat::chat_usage,
    ),
    components(schemas(
        error::ErrorResponse,
        models::TokenRequest,
        models::TokenResponse,
        models::SignedUrlRequest,
        models::SignedUrlResponse,
        models::ReportRequest,
        models::ReportResponse,
        models::ProcessReportRequest,
        models::ProcessReportResponse,
        models::AnalyzeResponse,
        models::ChatRequest,
        models::ChatResponse,
        models::HealthResponse,
        models::JobStatus,
        models::JobView,
        models::ChatUsage,
        models::ResultItem,
        models::SummaryStatistics,
        models::SpeechClips,
        models::ClipBreakdown,
        models::TimelineEntry,
        models::TranscriptionResult,
        models::WordTiming,
        models::SentimentSummary,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Token issuance"),
        (name = "uploads", description = "Signed upload URLs and direct uploads"),
        (name = "analysis", description = "Synchronous analysis and transcription"),
        (name = "reports", description = "Asynchronous report lifecycle"),
        (name = "chat", description = "Report chat assistant"),
    )
)]
pub struct ApiDoc;
