//! Request rate limiting.
//!
//! Fixed-window counters kept in memory, keyed by user for signed-in callers
//! and by client address otherwise.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use taisen_common::AppError;
use taisen_core::Identity;
use tokio::sync::RwLock;

/// Requests allowed per window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRule {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitRule {
    /// Create a rule.
    #[must_use]
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Built-in rules.
pub mod rules {
    use super::RateLimitRule;

    /// Every API request.
    pub const STANDARD: RateLimitRule = RateLimitRule::new(300, 60);

    /// Vote toggles, card creation, requests, and Top 4 edits.
    pub const WRITE: RateLimitRule = RateLimitRule::new(30, 60);
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32, limit: u32, reset: u64 },
    Limited { retry_after: u64 },
}

/// Fixed-window rate limiter.
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request against `key` and decide whether it may proceed.
    pub async fn check(&self, key: &str, rule: RateLimitRule) -> Decision {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        let length = Duration::from_secs(rule.window_secs);

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.duration_since(window.started) >= length {
            window.count = 0;
            window.started = now;
        }

        let reset = length
            .saturating_sub(now.duration_since(window.started))
            .as_secs();
        if window.count >= rule.max_requests {
            return Decision::Limited {
                retry_after: reset.max(1),
            };
        }

        window.count += 1;
        Decision::Allowed {
            remaining: rule.max_requests - window.count,
            limit: rule.max_requests,
            reset,
        }
    }

    /// Drop windows older than `max_window_secs`.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let horizon = Duration::from_secs(max_window_secs);
        self.windows
            .write()
            .await
            .retain(|_, w| w.started.elapsed() < horizon);
    }

    /// Number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Limiters shared by the rate limit middleware.
#[derive(Clone, Default)]
pub struct RateLimiterState {
    /// Global limiter for every request.
    pub standard: RateLimiter,
    /// Tighter limiter on write routes.
    pub write: RateLimiter,
}

impl RateLimiterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop stale windows from every limiter.
    pub async fn cleanup(&self) {
        self.standard.cleanup(rules::STANDARD.window_secs * 2).await;
        self.write.cleanup(rules::WRITE.window_secs * 2).await;
    }
}

/// Rejection carrying `Retry-After`.
#[derive(Debug)]
pub struct RateLimitError {
    /// Seconds until the window resets.
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = AppError::RateLimited.into_response();
        if let Ok(value) = HeaderValue::from_str(&self.retry_after.to_string()) {
            response.headers_mut().insert("Retry-After", value);
        }
        response
    }
}

fn client_ip(req: &Request<Body>) -> Option<IpAddr> {
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(forwarded) = forwarded.to_str()
        && let Some(first) = forwarded.split(',').next()
        && let Ok(ip) = first.trim().parse()
    {
        return Some(ip);
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn limit_key(req: &Request<Body>) -> String {
    if let Some(identity) = req.extensions().get::<Identity>() {
        format!("user:{}", identity.user_id)
    } else if let Some(ip) = client_ip(req) {
        format!("ip:{ip}")
    } else {
        "anonymous".to_string()
    }
}

/// Standard limit for every API request.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(&limiter.standard, rules::STANDARD, req, next).await
}

/// Tighter limit for write endpoints.
pub async fn rate_limit_write_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(&limiter.write, rules::WRITE, req, next).await
}

async fn enforce(
    limiter: &RateLimiter,
    rule: RateLimitRule,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    let key = limit_key(&req);

    match limiter.check(&key, rule).await {
        Decision::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset.into());
            Ok(response)
        }
        Decision::Limited { retry_after } => {
            tracing::debug!(key = %key, retry_after, "Rate limited");
            Err(RateLimitError { retry_after })
        }
    }
}
