use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};

use earshot_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::middleware::audit;
use crate::state::AppState;
use earshot_core::models::AnalyzeResponse;

/// Read the `file` part out of a multipart upload.
pub(crate) async fn read_audio_part(
    multipart: &mut Multipart,
) -> Result<(String, String, axum::body::Bytes), HttpAppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        return Ok((filename, content_type, data));
    }

    Err(HttpAppError(AppError::BadRequest(
        "Missing 'file' field in multipart body".to_string(),
    )))
}

/// Analyze an audio file synchronously
///
/// Accepts a multipart upload, runs speech detection, and returns the
/// per-chunk timeline with the aggregate verdict.
#[utoipa::path(
    post,
    path = "/analyze",
    tag = "analysis",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Analysis complete", body = AnalyzeResponse),
        (status = 400, description = "Invalid audio upload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 502, description = "Analysis service failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "analyze"))]
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let analyzer = state
        .analyzer
        .clone()
        .ok_or_else(|| AppError::Analysis("Analysis service is not configured".to_string()))?;

    let (filename, content_type, data) = read_audio_part(&mut multipart).await?;

    let sanitized = state
        .validator
        .validate_upload(&filename, &content_type, &data)
        .map_err(|e| {
            audit::log_security_event(
                "invalid_file_rejected",
                serde_json::json!({
                    "file_name": filename,
                    "content_type": content_type,
                    "reason": e.to_string(),
                }),
            );
            e
        })?;

    let outcome = analyzer.analyze(&data, &sanitized).await?;

    tracing::info!(
        file_name = %sanitized,
        total_chunks = outcome.total_chunks,
        overall_prediction = %outcome.overall_prediction,
        "Analysis complete"
    );

    Ok(Json(AnalyzeResponse {
        status: "success".to_string(),
        overall_prediction: outcome.overall_prediction.clone(),
        aggregate_confidence: outcome.aggregate_confidence,
        results: outcome.timeline_entries(),
    }))
}
