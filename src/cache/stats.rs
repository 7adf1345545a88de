//! Cache Statistics Module
//!
//! Tracks resolution metrics and reports index health.

use serde::Serialize;

// == Cache Status ==
/// Read-only snapshot of index health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// Entries currently held in memory
    pub total: usize,
    /// Entries still inside their validity window
    pub valid: usize,
    /// Entries past expiry awaiting a sweep
    pub expired: usize,
}

// == Cache Stats ==
/// Tracks resolution counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Requests answered from the in-memory index
    pub hits: u64,
    /// Requests that started a fresh fetch
    pub misses: u64,
    /// Requests that joined an already in-flight fetch
    pub joined: u64,
    /// Resolver calls made, retries included
    pub resolver_calls: u64,
    /// Fetches that exhausted their attempts
    pub failures: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the share of requests served without a new fetch.
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.joined;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_join(&mut self) {
        self.joined += 1;
    }

    pub fn record_resolver_calls(&mut self, calls: u32) {
        self.resolver_calls += u64::from(calls);
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }
}
