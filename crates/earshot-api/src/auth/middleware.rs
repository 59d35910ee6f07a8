//! Bearer token authentication middleware.
//!
//! Verifies the stateless signed token from the `Authorization` header and
//! attaches a [`CallerContext`] extension for downstream handlers. Repeated
//! failures from one IP are throttled so attackers cannot grind signatures.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use earshot_core::AppError;

use crate::auth::token::TokenService;
use crate::error::HttpAppError;
use crate::middleware::audit;
use crate::middleware::rate_limit::client_ip;

/// Identity established by a verified token.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub subject_id: String,
}

#[derive(Clone)]
pub struct AuthFailureLimiter {
    inner: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_failures: u32,
    window: Duration,
}

impl AuthFailureLimiter {
    pub fn new(max_failures: u32, window_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_failures,
            window: Duration::from_secs(window_seconds),
        }
    }

    pub async fn record_failure(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        let now = Instant::now();
        let (count, reset_at) = guard.entry(ip.to_string()).or_insert((0, now + self.window));
        if now >= *reset_at {
            *count = 0;
            *reset_at = now + self.window;
        }
        *count += 1;
        if *count >= self.max_failures {
            audit::log_security_event(
                "invalid_token_repeated",
                serde_json::json!({ "client_ip": ip, "failures": *count }),
            );
            true
        } else {
            false
        }
    }

    pub async fn is_blocked(&self, ip: &str) -> bool {
        let mut guard = self.inner.lock().await;
        if let Some((count, reset_at)) = guard.get(ip) {
            if Instant::now() >= *reset_at {
                guard.remove(ip);
                return false;
            }
            return *count >= self.max_failures;
        }
        false
    }
}

/// State required by the auth middleware, shared across protected routes.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub failure_limiter: Option<Arc<AuthFailureLimiter>>,
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);

    if let Some(ref limiter) = auth_state.failure_limiter {
        if limiter.is_blocked(&ip).await {
            return (StatusCode::TOO_MANY_REQUESTS, "Too many failed auth attempts")
                .into_response();
        }
    }

    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return reject(
                &auth_state,
                &ip,
                "Missing authorization header".to_string(),
            )
            .await;
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return reject(
            &auth_state,
            &ip,
            "Invalid authorization header format".to_string(),
        )
        .await;
    };

    match auth_state.tokens.verify(token) {
        Ok(subject_id) => {
            audit::log_authentication_attempt(
                Some(subject_id.clone()),
                Some(ip),
                true,
                None,
            );
            request.extensions_mut().insert(CallerContext { subject_id });
            next.run(request).await
        }
        Err(err) => reject(&auth_state, &ip, err.to_string()).await,
    }
}

async fn reject(auth_state: &AuthState, ip: &str, reason: String) -> Response {
    if let Some(ref limiter) = auth_state.failure_limiter {
        if limiter.record_failure(ip).await {
            return (StatusCode::TOO_MANY_REQUESTS, "Too many failed auth attempts")
                .into_response();
        }
    }
    audit::log_authentication_attempt(None, Some(ip.to_string()), false, Some(reason.clone()));
    HttpAppError(AppError::Unauthorized(reason)).into_response()
}
