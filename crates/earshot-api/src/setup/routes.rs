//! Route configuration and setup

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use earshot_core::constants::MAX_UPLOAD_BYTES;
use earshot_core::Config;

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthFailureLimiter, AuthState};
use crate::handlers;
use crate::middleware::{rate_limit_middleware, security_headers_middleware};
use crate::state::AppState;
use utoipa::OpenApi;

// Multipart framing overhead on top of the audio payload itself.
const BODY_LIMIT_OVERHEAD: usize = 1024 * 1024;

/// Maximum repeated auth failures per IP per minute before throttling.
const AUTH_FAILURE_LIMIT: u32 = 10;

/// Build the full application router over the given state.
pub fn build_router(state: AppState) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(&state.config)?;

    let auth_state = Arc::new(AuthState {
        tokens: state.tokens.clone(),
        failure_limiter: Some(Arc::new(AuthFailureLimiter::new(AUTH_FAILURE_LIMIT, 60))),
    });

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/auth/token",
            post(handlers::auth_token::issue_token).layer(
                axum::middleware::from_fn_with_state(
                    state.token_rate_limiter.clone(),
                    rate_limit_middleware,
                ),
            ),
        )
        .route("/storage/{*key}", put(handlers::storage_put::put_object))
        .route(
            "/process-report",
            post(handlers::process_report::process_report),
        )
        .route(
            "/api-doc/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );

    let protected_routes = Router::new()
        .route(
            "/generate-upload-url",
            post(handlers::upload_url::generate_upload_url),
        )
        .route(
            "/analyze",
            post(handlers::analyze::analyze).layer(axum::middleware::from_fn_with_state(
                state.analyze_rate_limiter.clone(),
                rate_limit_middleware,
            )),
        )
        .route(
            "/transcribe",
            post(handlers::transcribe::transcribe).layer(axum::middleware::from_fn_with_state(
                state.transcribe_rate_limiter.clone(),
                rate_limit_middleware,
            )),
        )
        .route("/report", post(handlers::report::dispatch_report))
        .route(
            "/report-status/{task_id}",
            get(handlers::report_status::report_status),
        )
        .route(
            "/chat",
            post(handlers::chat::chat).layer(axum::middleware::from_fn_with_state(
                state.chat_rate_limiter.clone(),
                rate_limit_middleware,
            )),
        )
        .route("/chat-usage/{task_id}", get(handlers::chat::chat_usage))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    let app = public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_LIMIT_OVERHEAD))
        .layer(RequestBodyLimitLayer::new(
            MAX_UPLOAD_BYTES + BODY_LIMIT_OVERHEAD,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
