use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use subtle::ConstantTimeEq;

use earshot_core::constants::{QUEUE_NAME_HEADER, QUEUE_SIGNATURE_HEADER, TASK_NAME_HEADER};
use earshot_core::models::{ProcessReportRequest, ProcessReportResponse};
use earshot_core::AppError;
use earshot_worker::HttpTaskQueue;

use crate::error::{ErrorResponse, HttpAppError};
use crate::middleware::audit;
use crate::state::AppState;

fn signature_matches(expected: &str, provided: &str) -> bool {
    expected.len() == provided.len()
        && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
}

/// Queue trigger: process one dispatched report
///
/// Only the task queue may call this. Requests must carry the queue-origin
/// headers, and when a shared secret is configured the body signature is
/// verified as well. Processing runs in the background; the handler returns an
/// acknowledgement immediately.
#[utoipa::path(
    post,
    path = "/process-report",
    tag = "reports",
    request_body = ProcessReportRequest,
    responses(
        (status = 200, description = "Task accepted", body = ProcessReportResponse),
        (status = 403, description = "Request did not come from the queue", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(operation = "process_report"))]
pub async fn process_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let task_id = headers
        .get(TASK_NAME_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let queue_name = headers
        .get(QUEUE_NAME_HEADER)
        .and_then(|h| h.to_str().ok());

    let (Some(task_id), Some(_queue_name)) = (task_id, queue_name) else {
        audit::log_security_event(
            "unauthorized_worker_trigger",
            serde_json::json!({ "reason": "missing queue headers" }),
        );
        return Err(HttpAppError(AppError::Forbidden(
            "Unauthorized request source".to_string(),
        )));
    };

    if let Some(ref secret) = state.config.queue_shared_secret {
        let provided = headers
            .get(QUEUE_SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        let expected = HttpTaskQueue::sign_body(secret.as_bytes(), &body);
        if !signature_matches(&expected, provided) {
            audit::log_security_event(
                "unauthorized_worker_trigger",
                serde_json::json!({ "task_id": task_id, "reason": "bad signature" }),
            );
            return Err(HttpAppError(AppError::Forbidden(
                "Unauthorized request source".to_string(),
            )));
        }
    }

    let request: ProcessReportRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid task payload: {}", e)))?;

    let processor = state
        .processor
        .clone()
        .ok_or_else(|| AppError::Analysis("Analysis service is not configured".to_string()))?;

    // Duplicate deliveries are harmless: init is insert-if-absent.
    state.jobs.init_pending(&task_id).await;

    tracing::info!(task_id = %task_id, file_name = %request.file_name, "Processing report");

    let response_task_id = task_id.clone();
    tokio::spawn(async move {
        if let Err(e) = processor
            .process(&task_id, &request.bucket_name, &request.file_name)
            .await
        {
            tracing::error!(task_id = %task_id, error = %e, "Report processing failed");
        }
    });

    Ok(Json(ProcessReportResponse {
        status: "processing".to_string(),
        task_id: response_task_id,
    }))
}
