use axum::{response::IntoResponse, Json};
use std::time::{SystemTime, UNIX_EPOCH};

use earshot_core::models::HealthResponse;

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> impl IntoResponse {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp,
    })
}
