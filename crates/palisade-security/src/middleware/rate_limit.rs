//! Sliding-window rate limiting middleware
//!
//! Clients are identified by a fingerprint derived from IP and User-Agent,
//! so two browsers behind one NAT consume separate quotas. The window is a
//! true sliding log, not fixed intervals: a request is admitted when fewer
//! than `max_requests` timestamps fall inside the trailing window.

use crate::config::{path_matches, RateLimitConfig, RateLimitQuota};
use crate::pipeline::{Middleware, Next, NextFuture};
use crate::store::{InMemoryRateLimitStore, RateLimitStore};
use crate::SecurityError;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rate limiting middleware
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimitMiddleware {
    /// Create rate limiting middleware backed by an in-memory window log
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryRateLimitStore::new()))
    }

    /// Create rate limiting middleware with an injected store
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self { config, store }
    }

    /// Client fingerprint: truncated SHA-256 of `"{ip}:{user_agent}"`.
    ///
    /// Truncation to 16 hex characters keeps keys short; collisions only
    /// cause two clients to share a quota, never a bypass.
    pub fn fingerprint(headers: &HeaderMap) -> String {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or("127.0.0.1");

        let user_agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let digest = Sha256::digest(format!("{}:{}", ip, user_agent).as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        hex[..16].to_string()
    }

    fn quota_for(&self, path: &str) -> RateLimitQuota {
        for (pattern, quota) in &self.config.overrides {
            if path_matches(pattern, path) {
                return *quota;
            }
        }
        RateLimitQuota {
            max_requests: self.config.max_requests,
            window_seconds: self.config.window_seconds,
        }
    }

    fn is_exempt_path(&self, path: &str) -> bool {
        self.config
            .exempt_paths
            .iter()
            .any(|pattern| path_matches(pattern, path))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Middleware for RateLimitMiddleware {
    fn handle(&self, request: Request, next: Next) -> NextFuture<'static> {
        let limiter = self.clone();
        Box::pin(async move {
            let path = request.uri().path().to_string();
            if limiter.is_exempt_path(&path) {
                return next.run(request).await;
            }

            let key = Self::fingerprint(request.headers());
            let quota = limiter.quota_for(&path);

            let decision = match limiter
                .store
                .hit(&key, now_ms(), quota.max_requests, quota.window_seconds * 1_000)
                .await
            {
                Ok(decision) => decision,
                // Fail closed: an unreachable store must not disable the gate
                Err(err) => {
                    log::error!("rate limit store failure: {}", err);
                    return err.into_response();
                }
            };

            if !decision.allowed {
                log::warn!(
                    "rate limit exceeded for {} on {} ({}/{})",
                    key,
                    path,
                    decision.current,
                    decision.limit
                );
                return SecurityError::RateLimitExceeded {
                    limit: quota.max_requests,
                    window_seconds: quota.window_seconds,
                }
                .into_response();
            }

            let mut response = next.run(request).await;
            let remaining = decision.limit.saturating_sub(decision.current);
            if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
                response.headers_mut().insert("x-ratelimit-limit", value);
            }
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                response
                    .headers_mut()
                    .insert("x-ratelimit-remaining", value);
            }
            response
        })
    }

    fn name(&self) -> &'static str {
        "RateLimitMiddleware"
    }
}
