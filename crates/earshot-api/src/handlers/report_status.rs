use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};

use earshot_core::models::{Job, JobView, Tier};

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::TierQuery;
use crate::projection::project;
use crate::state::AppState;

/// Poll the status of a dispatched report
///
/// Unknown task ids report as pending rather than erroring: the queue delivery
/// may simply not have arrived yet.
#[utoipa::path(
    get,
    path = "/report-status/{task_id}",
    tag = "reports",
    params(
        ("task_id" = String, Path, description = "Task id returned by /report"),
        ("has_subscription" = bool, Query, description = "Subscription tier flag")
    ),
    responses(
        (status = 200, description = "Job state after tier projection", body = JobView),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(task_id = %task_id, operation = "report_status"))]
pub async fn report_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<TierQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let job = state.jobs.get(&task_id).await.unwrap_or_else(Job::pending);
    let view = project(job, Tier::from(query.has_subscription));
    Ok(Json(view))
}
