// SPDX-FileCopyrightText: 2026 Eterna Tech
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter keyed by source address.
//!
//! Coarse abuse deterrence, not precise quota accounting: the window is
//! fixed rather than sliding, so a burst straddling a window boundary can
//! briefly exceed the intended rate. The stored counter also keeps counting
//! past the maximum; denial is based on exceeding it, and the increment is
//! never rolled back.
//!
//! State lives behind [`RateStore`] so the in-memory map can be swapped for
//! a shared store without touching call sites. Entries are never evicted;
//! acceptable growth for a low-traffic endpoint.

use crate::config::RateLimitConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Per-source accounting record.
#[derive(Debug, Clone, Copy)]
pub struct RateRecord {
    /// Requests seen in the current window (may exceed the maximum)
    pub count: u32,
    /// When the current window opened
    pub window_start: Instant,
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in the current window
        remaining: u32,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window elapses
        retry_after: Duration,
    },
}

/// Mapping abstraction backing the limiter.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<RateRecord>;
    async fn put(&self, key: &str, record: RateRecord);
}

/// Process-wide in-memory store.
#[derive(Default)]
pub struct InMemoryRateStore {
    entries: RwLock<HashMap<String, RateRecord>>,
}

impl InMemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn get(&self, key: &str) -> Option<RateRecord> {
        self.entries.read().await.get(key).copied()
    }

    async fn put(&self, key: &str, record: RateRecord) {
        self.entries.write().await.insert(key.to_string(), record);
    }
}

/// Fixed-window rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateStore>,
    // Serializes the get/put pair so concurrent requests from one source
    // cannot interleave mid-update.
    update_lock: Mutex<()>,
}

impl RateLimiter {
    /// Create a limiter over the given store.
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateStore>) -> Self {
        Self {
            config,
            store,
            update_lock: Mutex::new(()),
        }
    }

    /// Decide allow/deny for one request from `key` at time `now`, mutating
    /// the store accordingly.
    pub async fn check(&self, key: &str, now: Instant) -> RateLimitResult {
        let _guard = self.update_lock.lock().await;
        let window = self.config.window_duration();
        let max = self.config.max_requests;

        let record = match self.store.get(key).await {
            Some(record) if now.saturating_duration_since(record.window_start) <= window => {
                RateRecord {
                    count: record.count + 1,
                    window_start: record.window_start,
                }
            }
            // First request from this source, or the window elapsed: fresh window.
            _ => RateRecord {
                count: 1,
                window_start: now,
            },
        };
        self.store.put(key, record).await;

        if record.count > max {
            let elapsed = now.saturating_duration_since(record.window_start);
            let retry_after = window.saturating_sub(elapsed);
            debug!(source = %key, count = record.count, ?retry_after, "Source rate limit exceeded");
            RateLimitResult::Limited { retry_after }
        } else {
            RateLimitResult::Allowed {
                remaining: max - record.count,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            RateLimitConfig {
                max_requests,
                window_secs,
            },
            Arc::new(InMemoryRateStore::new()),
        )
    }

    #[tokio::test]
    async fn test_requests_up_to_maximum_allowed() {
        let limiter = limiter(10, 60);
        let now = Instant::now();

        for i in 0..10 {
            match limiter.check("203.0.113.7", now).await {
                RateLimitResult::Allowed { remaining } => assert_eq!(remaining, 10 - i - 1),
                RateLimitResult::Limited { .. } => panic!("request {} should be allowed", i + 1),
            }
        }
    }

    #[tokio::test]
    async fn test_eleventh_request_denied() {
        let limiter = limiter(10, 60);
        let now = Instant::now();

        for _ in 0..10 {
            limiter.check("203.0.113.7", now).await;
        }

        match limiter.check("203.0.113.7", now).await {
            RateLimitResult::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(60));
            }
            RateLimitResult::Allowed { .. } => panic!("11th request should be limited"),
        }
    }

    #[tokio::test]
    async fn test_counter_keeps_climbing_past_maximum() {
        let store = Arc::new(InMemoryRateStore::new());
        let limiter = RateLimiter::new(
            RateLimitConfig {
                max_requests: 2,
                window_secs: 60,
            },
            store.clone(),
        );
        let now = Instant::now();

        for _ in 0..5 {
            limiter.check("203.0.113.7", now).await;
        }

        let record = store.get("203.0.113.7").await.expect("record exists");
        assert_eq!(record.count, 5);
    }

    #[tokio::test]
    async fn test_window_elapse_resets_count() {
        let limiter = limiter(10, 60);
        let start = Instant::now();

        for _ in 0..11 {
            limiter.check("203.0.113.7", start).await;
        }

        // 61 seconds later the source gets a fresh window.
        let later = start + Duration::from_secs(61);
        match limiter.check("203.0.113.7", later).await {
            RateLimitResult::Allowed { remaining } => assert_eq!(remaining, 9),
            RateLimitResult::Limited { .. } => panic!("fresh window should allow"),
        }
    }

    #[tokio::test]
    async fn test_sources_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        limiter.check("203.0.113.7", now).await;
        match limiter.check("203.0.113.8", now).await {
            RateLimitResult::Allowed { .. } => {}
            RateLimitResult::Limited { .. } => panic!("other source should be unaffected"),
        }
    }

    #[tokio::test]
    async fn test_retry_after_shrinks_with_elapsed_time() {
        let limiter = limiter(1, 60);
        let start = Instant::now();

        limiter.check("203.0.113.7", start).await;
        let later = start + Duration::from_secs(45);
        match limiter.check("203.0.113.7", later).await {
            RateLimitResult::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(15));
            }
            RateLimitResult::Allowed { .. } => panic!("should be limited"),
        }
    }
}
