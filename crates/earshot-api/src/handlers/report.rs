use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use earshot_core::constants::UPLOAD_FRESHNESS_WINDOW_SECS;
use earshot_core::models::{ProcessReportRequest, ReportRequest, ReportResponse};
use earshot_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Dispatch asynchronous analysis of an uploaded file
///
/// The object must exist and must have been uploaded within the last minute;
/// anything older did not come through a freshly issued signed URL and is
/// rejected as stale. A pending job record is written before the task id is
/// returned, so a status poll can never miss the job.
#[utoipa::path(
    post,
    path = "/report",
    tag = "reports",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Analysis dispatched", body = ReportResponse),
        (status = 400, description = "Stale upload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, request),
    fields(file_name = %request.file_name, operation = "dispatch_report")
)]
pub async fn dispatch_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.storage.exists(&request.file_name).await? {
        return Err(HttpAppError(AppError::NotFound(format!(
            "File not found: {}",
            request.file_name
        ))));
    }

    let meta = state.storage.head(&request.file_name).await?;
    let age_secs = (Utc::now() - meta.created_at).num_seconds();
    if age_secs > UPLOAD_FRESHNESS_WINDOW_SECS {
        return Err(HttpAppError(AppError::StaleUpload(format!(
            "Upload is {}s old; request a new upload URL and re-upload the file",
            age_secs
        ))));
    }

    let task_id = state
        .queue
        .dispatch(ProcessReportRequest {
            bucket_name: request.bucket_name,
            file_name: request.file_name.clone(),
        })
        .await?;

    // Record the job before the client sees the id.
    state.jobs.init_pending(&task_id).await;

    tracing::info!(task_id = %task_id, file_name = %request.file_name, "Dispatched report");

    Ok(Json(ReportResponse {
        task_id,
        status: "pending".to_string(),
    }))
}
