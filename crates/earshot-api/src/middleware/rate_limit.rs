//! In-memory per-client rate limiting.
//!
//! Sharded HashMap of counting buckets keyed by client IP. Each route group
//! gets its own `RateLimiter` with its own per-minute limit.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::middleware::audit;

const WINDOW_SECONDS: u64 = 60;
const MAX_BUCKETS_PER_SHARD: usize = 10_000;

#[derive(Clone)]
struct Bucket {
    count: u32,
    reset_at: Instant,
}

impl Bucket {
    fn new() -> Self {
        Self {
            count: 0,
            reset_at: Instant::now() + Duration::from_secs(WINDOW_SECONDS),
        }
    }

    fn check_and_increment(&mut self, limit: u32) -> (bool, u32) {
        let now = Instant::now();

        // Reset if window expired
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + Duration::from_secs(WINDOW_SECONDS);
        }

        if self.count < limit {
            self.count += 1;
            (true, limit.saturating_sub(self.count))
        } else {
            (false, 0)
        }
    }

    fn reset_in(&self) -> Duration {
        self.reset_at.saturating_duration_since(Instant::now())
    }
}

/// Sharded rate limiter to reduce lock contention.
///
/// Keys are hashed to pick a shard; buckets within a shard share one mutex.
#[derive(Clone)]
pub struct RateLimiter {
    shards: Vec<Arc<Mutex<HashMap<String, Bucket>>>>,
    shard_count: usize,
    limit_per_minute: u32,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self::with_shards(limit_per_minute, 16)
    }

    pub fn with_shards(limit_per_minute: u32, shard_count: usize) -> Self {
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
            limit_per_minute,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit_per_minute
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    /// Record one request for `key`. Returns the remaining allowance, or the
    /// duration until the window resets when the limit is exhausted.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let shard = &self.shards[self.shard_index(key)];
        let mut buckets = shard.lock().await;

        // Bounded memory: evict expired buckets when a shard fills up.
        if buckets.len() >= MAX_BUCKETS_PER_SHARD {
            let now = Instant::now();
            buckets.retain(|_, bucket| bucket.reset_at > now);
        }

        let bucket = buckets.entry(key.to_string()).or_insert_with(Bucket::new);
        let (allowed, remaining) = bucket.check_and_increment(self.limit_per_minute);
        if allowed {
            Ok(remaining)
        } else {
            Err(bucket.reset_in())
        }
    }
}

/// Extract the client IP: first entry of `X-Forwarded-For` if present,
/// otherwise the connection peer address.
pub fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Per-IP rate limiting middleware.
///
/// Adds `X-RateLimit-Limit` and `X-RateLimit-Remaining` headers to responses,
/// and `Retry-After` on 429.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = format!("ip:{}", client_ip(&request));
    let limit = limiter.limit();

    match limiter.check(&key).await {
        Ok(remaining) => {
            let mut response = next.run(request).await;

            if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
                response.headers_mut().insert("X-RateLimit-Limit", value);
            }
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                response
                    .headers_mut()
                    .insert("X-RateLimit-Remaining", value);
            }

            response
        }
        Err(reset_in) => {
            audit::log_rate_limit_exceeded(
                Some(key.clone()),
                request.uri().path().to_string(),
                limit,
            );

            let reset_seconds = reset_in.as_secs().max(1);
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(serde_json::json!({
                    "error": "Too many requests. Please slow down."
                })),
            )
                .into_response();

            if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
                response.headers_mut().insert("X-RateLimit-Limit", value);
            }
            response
                .headers_mut()
                .insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
            if let Ok(value) = HeaderValue::from_str(&reset_seconds.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }

            response
        }
    }
}
