use axum::{extract::State, response::IntoResponse, Extension, Json};
use chrono::Utc;
use std::time::Duration;

use earshot_core::constants::UPLOAD_URL_TTL_SECS;
use earshot_core::models::{SignedUrlRequest, SignedUrlResponse};

use crate::auth::CallerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::middleware::audit;
use crate::state::AppState;

/// Issue a short-lived signed URL for a direct audio upload
///
/// The URL is bound to a unique object key and the declared content type, and
/// expires after a few seconds. The returned `file_name` is the object key the
/// client must reference when requesting the report.
#[utoipa::path(
    post,
    path = "/generate-upload-url",
    tag = "uploads",
    request_body = SignedUrlRequest,
    responses(
        (status = 200, description = "Signed URL generated", body = SignedUrlResponse),
        (status = 400, description = "Invalid file name or type", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip(state, request),
    fields(file_name = %request.file_name, operation = "generate_upload_url")
)]
pub async fn generate_upload_url(
    State(state): State<AppState>,
    caller: Option<Extension<CallerContext>>,
    Json(request): Json<SignedUrlRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subject_id = caller.map(|Extension(ctx)| ctx.subject_id);

    let sanitized = state
        .validator
        .validate_upload_request(&request.file_name, &request.file_type)
        .map_err(|e| {
            audit::AuditLogEntry::new("invalid_file_rejected")
                .with_subject_id(subject_id.clone())
                .with_details(serde_json::json!({
                    "file_name": request.file_name,
                    "file_type": request.file_type,
                }))
                .with_failure(e.to_string())
                .log();
            e
        })?;

    // Timestamp prefix keeps keys unique across repeated uploads of one file.
    let key = format!("{}-{}", Utc::now().timestamp(), sanitized);

    let signed_url = state.storage.signed_put_url(
        &key,
        &request.file_type,
        Duration::from_secs(UPLOAD_URL_TTL_SECS),
    )?;

    audit::AuditLogEntry::new("upload_url_generated")
        .with_subject_id(subject_id)
        .with_details(serde_json::json!({
            "file_name": key,
            "file_type": request.file_type,
        }))
        .log();

    tracing::info!(key = %key, "Generated signed upload URL");

    Ok(Json(SignedUrlResponse {
        signed_url,
        file_name: key,
        bucket: state.config.storage_bucket.clone(),
    }))
}
