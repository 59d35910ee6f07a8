use axum::{
    extract::{Multipart, Query, State},
    response::IntoResponse,
    Json,
};

use earshot_analysis::transcribe_to_canonical;
use earshot_core::constants::FREE_TIER_WORD_LIMIT;
use earshot_core::models::{TranscriptionResult, Tier};

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::analyze::read_audio_part;
use crate::handlers::TierQuery;
use crate::state::AppState;

/// Transcribe an audio file synchronously
///
/// Free-tier callers get the transcript truncated to the first fifty words.
#[utoipa::path(
    post,
    path = "/transcribe",
    tag = "analysis",
    request_body(content_type = "multipart/form-data"),
    params(
        ("has_subscription" = bool, Query, description = "Subscription tier flag")
    ),
    responses(
        (status = 200, description = "Transcription result", body = TranscriptionResult),
        (status = 400, description = "Invalid audio upload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "transcribe"))]
pub async fn transcribe(
    State(state): State<AppState>,
    Query(query): Query<TierQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (filename, content_type, data) = read_audio_part(&mut multipart).await?;

    let _sanitized = state
        .validator
        .validate_upload(&filename, &content_type, &data)?;

    let mut result = match state.transcriber.as_deref() {
        Some(provider) => transcribe_to_canonical(provider, &data, &content_type).await,
        None => TranscriptionResult::default(),
    };

    if Tier::from(query.has_subscription) == Tier::Free && result.words.len() > FREE_TIER_WORD_LIMIT
    {
        result.words.truncate(FREE_TIER_WORD_LIMIT);
        result.is_limited = Some(true);
    }

    Ok(Json(result))
}
