//! Pluggable state stores for the stateful gates
//!
//! CSRF tokens and rate-limit buckets live behind trait objects so the
//! in-process maps used here can be swapped for a shared external store
//! (one process per worker does not share this state) without touching the
//! middleware call sites.

use crate::{SecurityError, SecurityResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Server-side CSRF token storage, keyed by session identifier
#[async_trait]
pub trait TokenStore: Send + Sync + fmt::Debug {
    async fn get(&self, session_id: &str) -> SecurityResult<Option<String>>;

    /// Store `token` for the session unless one already exists; returns the
    /// token that ended up stored. Makes issuance idempotent under races.
    async fn set_if_absent(&self, session_id: &str, token: String) -> SecurityResult<String>;

    /// Drop the session's token (session end)
    async fn remove(&self, session_id: &str) -> SecurityResult<()>;
}

/// In-memory token store
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, session_id: &str) -> SecurityResult<Option<String>> {
        Ok(self.tokens.read().await.get(session_id).cloned())
    }

    async fn set_if_absent(&self, session_id: &str, token: String) -> SecurityResult<String> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .entry(session_id.to_string())
            .or_insert(token)
            .clone())
    }

    async fn remove(&self, session_id: &str) -> SecurityResult<()> {
        self.tokens.write().await.remove(session_id);
        Ok(())
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    /// Whether the request was admitted (and recorded)
    pub allowed: bool,
    /// Requests retained in the window, including this one if admitted
    pub current: u32,
    /// The limit that applied
    pub limit: u32,
}

/// Sliding-window request log storage, keyed by client fingerprint
#[async_trait]
pub trait RateLimitStore: Send + Sync + fmt::Debug {
    /// Prune the fingerprint's timestamps older than `now_ms - window_ms`,
    /// then record `now_ms` if the retained count is below `limit`.
    async fn hit(
        &self,
        key: &str,
        now_ms: u64,
        limit: u32,
        window_ms: u64,
    ) -> SecurityResult<RateDecision>;

    /// Drop buckets whose newest timestamp is older than the window
    async fn prune(&self, now_ms: u64, window_ms: u64) -> SecurityResult<()>;
}

/// In-memory sliding-window log store.
///
/// Bucket count is bounded: once the map grows past `max_buckets`, stale
/// buckets are swept as part of the next hit.
#[derive(Debug)]
pub struct InMemoryRateLimitStore {
    buckets: Mutex<HashMap<String, Vec<u64>>>,
    max_buckets: usize,
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_buckets: 10_000,
        }
    }
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_buckets(max_buckets: usize) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_buckets,
        }
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(
        &self,
        key: &str,
        now_ms: u64,
        limit: u32,
        window_ms: u64,
    ) -> SecurityResult<RateDecision> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| SecurityError::StoreError("rate limit lock poisoned".to_string()))?;

        let decision = {
            let bucket = buckets.entry(key.to_string()).or_default();
            bucket.retain(|&ts| now_ms.saturating_sub(ts) < window_ms);

            let retained = bucket.len() as u32;
            let allowed = retained < limit;
            if allowed {
                bucket.push(now_ms);
            }

            RateDecision {
                allowed,
                current: if allowed { retained + 1 } else { retained },
                limit,
            }
        };

        if buckets.len() > self.max_buckets {
            buckets.retain(|_, bucket| {
                bucket
                    .last()
                    .is_some_and(|&ts| now_ms.saturating_sub(ts) < window_ms)
            });
        }

        Ok(decision)
    }

    async fn prune(&self, now_ms: u64, window_ms: u64) -> SecurityResult<()> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| SecurityError::StoreError("rate limit lock poisoned".to_string()))?;

        buckets.retain(|_, bucket| {
            bucket
                .last()
                .is_some_and(|&ts| now_ms.saturating_sub(ts) < window_ms)
        });
        Ok(())
    }
}
