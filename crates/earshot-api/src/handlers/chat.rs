use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use earshot_core::constants::INITIAL_CHAT_CONTEXT;
use earshot_core::models::{ChatRequest, ChatResponse, ChatUsage};
use earshot_core::AppError;

use crate::auth::CallerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::middleware::audit;
use crate::services;
use crate::state::AppState;

const FREE_TIER_MESSAGE: &str = "Chat features are only available for Pro subscribers. \
    Please upgrade to access AI chat assistance.";

const QUOTA_MESSAGE: &str = "You've reached the maximum of 10 chat messages for this report. \
    Please analyze a new audio file to start a fresh conversation.";

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    #[serde(default)]
    pub has_subscription: bool,
    #[serde(default)]
    pub task_id: Option<String>,
}

/// Chat about an analyzed report
///
/// Free-tier callers get a fixed upsell response. Subscribers are limited to
/// ten messages per report; hitting the cap returns a fixed response without
/// consuming quota.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "chat",
    request_body = ChatRequest,
    params(
        ("has_subscription" = bool, Query, description = "Subscription tier flag"),
        ("task_id" = Option<String>, Query, description = "Report the conversation is about")
    ),
    responses(
        (status = 200, description = "Assistant response", body = ChatResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Chat service failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(operation = "chat"))]
pub async fn chat(
    State(state): State<AppState>,
    caller: Option<Extension<CallerContext>>,
    Query(query): Query<ChatQuery>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subject_id = caller.map(|Extension(ctx)| ctx.subject_id);

    if query.has_subscription {
        // Tier is client-asserted; keep a trail for abuse review.
        audit::log_security_event(
            "unverified_subscription_claim",
            serde_json::json!({
                "subject_id": subject_id,
                "endpoint": "chat",
            }),
        );
    } else {
        return Ok(Json(ChatResponse {
            response: FREE_TIER_MESSAGE.to_string(),
            context: INITIAL_CHAT_CONTEXT.to_string(),
        }));
    }

    if let Some(ref task_id) = query.task_id {
        let (allowed, remaining) = state.jobs.check_and_increment_chat(task_id).await;
        if !allowed {
            return Ok(Json(ChatResponse {
                response: QUOTA_MESSAGE.to_string(),
                context: request
                    .context
                    .clone()
                    .unwrap_or_else(|| INITIAL_CHAT_CONTEXT.to_string()),
            }));
        }
        tracing::debug!(task_id = %task_id, remaining = remaining, "Chat message counted");
    }

    let model = state
        .chat
        .clone()
        .ok_or_else(|| AppError::Internal("Chat service is not configured".to_string()))?;

    let context = services::current_context(request.context.as_deref());
    let prompt = services::build_prompt(&request.message, &context, request.analysis_data.as_ref());

    let reply = model
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Internal(format!("Chat failed: {}", e)))?;

    let new_context = services::extend_context(&context, &request.message, &reply);

    Ok(Json(ChatResponse {
        response: reply,
        context: new_context,
    }))
}

/// Report chat quota usage for one report
#[utoipa::path(
    get,
    path = "/chat-usage/{task_id}",
    tag = "chat",
    params(("task_id" = String, Path, description = "Task id returned by /report")),
    responses(
        (status = 200, description = "Quota usage", body = ChatUsage),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(task_id = %task_id, operation = "chat_usage"))]
pub async fn chat_usage(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.jobs.chat_usage(&task_id).await))
}
