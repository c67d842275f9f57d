//! Per-caller request throttling.
//!
//! Fixed windows per caller key. The default store is process-local and does
//! not coordinate across instances; state is lost on restart.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::LimitsConfig;

/// Counter state for a single caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub key: String,
    pub count: u32,
    pub window_start: Instant,
}

/// Storage behind the rate limiter.
///
/// `increment` must be atomic per key: the window reset and the increment
/// happen under the same lock. Different keys must not block each other.
pub trait RateLimitStore: Send + Sync {
    /// Current entry for a key, if any.
    fn get(&self, key: &str) -> Option<RateLimitEntry>;

    /// Start a fresh window if the current one is older than `window`, then
    /// count one request. Returns the updated entry.
    fn increment(&self, key: &str, now: Instant, window: Duration) -> RateLimitEntry;

    /// Forget a key.
    fn reset(&self, key: &str);

    /// Drop entries whose window has elapsed. Returns how many were removed.
    fn prune(&self, _now: Instant, _window: Duration) -> usize {
        0
    }
}

/// In-process store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    fn increment(&self, key: &str, now: Instant, window: Duration) -> RateLimitEntry {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                key: key.to_string(),
                count: 0,
                window_start: now,
            });
        if now.saturating_duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count = entry.count.saturating_add(1);
        entry.value().clone()
    }

    fn reset(&self, key: &str) {
        self.entries.remove(key);
    }

    fn prune(&self, now: Instant, window: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.window_start) <= window);
        before.saturating_sub(self.entries.len())
    }
}

/// Whether a caller may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Limited,
    NotLimited,
}

impl RateDecision {
    pub fn is_limited(&self) -> bool {
        matches!(self, RateDecision::Limited)
    }
}

/// Gate on how many pipeline invocations a caller may make per window.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    /// Default window length.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
    /// Default number of requests allowed per window.
    pub const DEFAULT_MAX_REQUESTS: u32 = 40;

    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self::with_store(Arc::new(InMemoryRateLimitStore::new()), window, max_requests)
    }

    pub fn with_store(store: Arc<dyn RateLimitStore>, window: Duration, max_requests: u32) -> Self {
        Self {
            store,
            window,
            max_requests,
        }
    }

    pub fn from_config(cfg: &LimitsConfig) -> Self {
        Self::new(Duration::from_secs(cfg.window_secs), cfg.max_requests)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Count a request for `key` and report whether it exceeds the threshold.
    pub fn should_limit(&self, key: &str) -> bool {
        self.should_limit_at(key, Instant::now())
    }

    /// Like [`should_limit`](Self::should_limit) with an explicit clock.
    pub fn should_limit_at(&self, key: &str, now: Instant) -> bool {
        let entry = self.store.increment(key, now, self.window);
        let limited = entry.count > self.max_requests;
        if limited {
            tracing::info!(
                "Rate limit exceeded: key={}, count={}, max={}",
                key,
                entry.count,
                self.max_requests
            );
        }
        limited
    }

    pub fn decide(&self, key: &str) -> RateDecision {
        if self.should_limit(key) {
            RateDecision::Limited
        } else {
            RateDecision::NotLimited
        }
    }

    pub fn reset(&self, key: &str) {
        self.store.reset(key);
    }

    /// Evict entries whose window has elapsed.
    pub fn prune_expired(&self) -> usize {
        self.store.prune(Instant::now(), self.window)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW, Self::DEFAULT_MAX_REQUESTS)
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("window", &self.window)
            .field("max_requests", &self.max_requests)
            .finish()
    }
}
