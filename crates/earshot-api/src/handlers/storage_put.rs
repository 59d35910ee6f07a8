use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use earshot_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GrantQuery {
    pub token: String,
}

/// Accept a direct upload through a signed URL
///
/// The grant token issued by `/generate-upload-url` authorizes exactly one
/// object key and content type; anything else is rejected.
#[utoipa::path(
    put,
    path = "/storage/{key}",
    tag = "uploads",
    params(
        ("key" = String, Path, description = "Object key from the signed URL"),
        ("token" = String, Query, description = "Upload grant token")
    ),
    request_body(content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Object stored"),
        (status = 401, description = "Invalid or expired grant", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(key = %key, operation = "storage_put"))]
pub async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<GrantQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let content_type = headers
        .get("content-type")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Content-Type header".to_string()))?
        .to_string();

    state
        .storage
        .verify_put_grant(&key, &content_type, &query.token)?;

    state.validator.validate_file_size(body.len())?;

    state.storage.put(&key, &content_type, body).await?;

    tracing::info!(key = %key, "Stored uploaded object");

    Ok(Json(serde_json::json!({ "status": "stored", "file_name": key })))
}
