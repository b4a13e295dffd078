//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses and removals by cause.

use serde::Serialize;

use crate::notify::RemovalCause;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted by the capacity policy
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Number of values overwritten by a put on a live key
    pub replacements: u64,
    /// Number of entries removed through `remove`
    pub explicit_removals: u64,
    /// Number of entries dropped by `clear`
    pub cleared: u64,
    /// Number of listener invocations that panicked
    pub listener_failures: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
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

    // == Record Removal ==
    /// Bumps the counter matching `cause`.
    pub fn record_removal(&mut self, cause: RemovalCause) {
        match cause {
            RemovalCause::Expired => self.expirations += 1,
            RemovalCause::Evicted => self.evictions += 1,
            RemovalCause::Replaced => self.replacements += 1,
            RemovalCause::ExplicitRemoval => self.explicit_removals += 1,
            RemovalCause::Cleared => self.cleared += 1,
        }
    }

    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
