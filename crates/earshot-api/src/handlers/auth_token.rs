use axum::{extract::State, response::IntoResponse, Json};
use uuid::Uuid;

use earshot_core::models::{TokenRequest, TokenResponse};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Issue a short-lived auth token for API access
///
/// Anonymous callers get a random subject id; apps can pass their own user id
/// so tokens are attributable.
#[utoipa::path(
    post,
    path = "/auth/token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid subject id", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "issue_token"))]
pub async fn issue_token(
    State(state): State<AppState>,
    request: Option<Json<TokenRequest>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subject_id = request
        .and_then(|Json(r)| r.app_user_id)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let token = state.tokens.issue(&subject_id)?;

    tracing::debug!(subject_id = %subject_id, "Issued auth token");

    Ok(Json(TokenResponse {
        token,
        expires_in: state.tokens.ttl_secs(),
    }))
}
