//! Request and response DTOs for the public HTTP surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::job::TimelineEntry;

/// Request for a stateless auth token.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Caller-supplied subject id; a random UUID is assigned when absent.
    #[serde(default)]
    pub app_user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Request for a short-lived signed upload URL.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignedUrlRequest {
    pub file_name: String,
    pub file_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignedUrlResponse {
    pub signed_url: String,
    /// Unique object key the upload is bound to.
    pub file_name: String,
    pub bucket: String,
}

/// Request to dispatch analysis of an uploaded object.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportRequest {
    pub bucket_name: String,
    pub file_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub task_id: String,
    pub status: String,
}

/// Payload the queue delivers to the worker trigger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessReportRequest {
    pub bucket_name: String,
    pub file_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessReportResponse {
    pub status: String,
    pub task_id: String,
}

/// Synchronous analysis response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub status: String,
    pub overall_prediction: String,
    pub aggregate_confidence: f64,
    pub results: Vec<TimelineEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    /// Prior conversation context; the system context is prepended when absent.
    #[serde(default)]
    pub context: Option<String>,
    /// Analysis results supplied by the client for prompt grounding.
    #[serde(default)]
    pub analysis_data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub context: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: f64,
}
