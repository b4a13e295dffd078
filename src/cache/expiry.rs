//! Expiry Checker Module
//!
//! Decides whether an entry's TTL has elapsed.

use std::time::{Duration, Instant};

use crate::cache::Entry;

// == Expiry Checker ==
/// TTL rules shared by every entry of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryChecker {
    /// TTL for entries without their own override, None = never expire
    default_ttl: Option<Duration>,
    /// true = sliding window from last access, false = fixed window from last write
    refresh_on_access: bool,
}

impl ExpiryChecker {
    // == Constructor ==
    pub fn new(default_ttl: Option<Duration>, refresh_on_access: bool) -> Self {
        Self {
            default_ttl,
            refresh_on_access,
        }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub fn refresh_on_access(&self) -> bool {
        self.refresh_on_access
    }

    /// TTL that applies to `entry`, taking the cache default into account.
    pub fn effective_ttl<K, V>(&self, entry: &Entry<K, V>) -> Option<Duration> {
        entry.ttl.or(self.default_ttl)
    }

    // == Deadline ==
    /// Instant at which `entry` stops being live, None if it never expires.
    pub fn deadline<K, V>(&self, entry: &Entry<K, V>) -> Option<Instant> {
        let ttl = self.effective_ttl(entry)?;
        let start = if self.refresh_on_access {
            entry.last_accessed_at
        } else {
            entry.updated_at
        };
        // A deadline past the representable range is the same as no deadline
        start.checked_add(ttl)
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= deadline`, so a
    /// TTL that has fully elapsed never yields a live entry.
    pub fn is_expired<K, V>(&self, entry: &Entry<K, V>, now: Instant) -> bool {
        match self.deadline(entry) {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    // == Remaining ==
    /// Time left before `entry` expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the TTL has elapsed
    /// - `Some(remaining)` if the entry has a TTL that hasn't elapsed
    /// - `None` if the entry never expires
    pub fn remaining<K, V>(&self, entry: &Entry<K, V>, now: Instant) -> Option<Duration> {
        self.deadline(entry)
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ttl: Option<Duration>, now: Instant) -> Entry<&'static str, u32> {
        Entry::new("k", 1, ttl, now)
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let checker = ExpiryChecker::new(None, true);
        let now = Instant::now();
        let e = entry(None, now);

        assert!(!checker.is_expired(&e, now + Duration::from_secs(3600)));
        assert_eq!(checker.remaining(&e, now), None);
    }

    #[test]
    fn test_default_ttl_applies_without_override() {
        let checker = ExpiryChecker::new(Some(Duration::from_millis(100)), true);
        let now = Instant::now();
        let e = entry(None, now);

        assert!(!checker.is_expired(&e, now + Duration::from_millis(99)));
        assert!(checker.is_expired(&e, now + Duration::from_millis(100)));
    }

    #[test]
    fn test_entry_override_wins_over_default() {
        let checker = ExpiryChecker::new(Some(Duration::from_secs(60)), true);
        let now = Instant::now();
        let e = entry(Some(Duration::from_millis(10)), now);

        assert!(checker.is_expired(&e, now + Duration::from_millis(20)));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let checker = ExpiryChecker::new(None, true);
        let now = Instant::now();
        let e = entry(Some(Duration::from_millis(5)), now);

        let deadline = checker.deadline(&e).unwrap();
        assert!(checker.is_expired(&e, deadline), "expired exactly at deadline");
        assert_eq!(checker.remaining(&e, deadline), Some(Duration::ZERO));
    }

    #[test]
    fn test_sliding_ttl_measures_from_last_access() {
        let checker = ExpiryChecker::new(Some(Duration::from_millis(100)), true);
        let now = Instant::now();
        let mut e = entry(None, now);

        e.touch(now + Duration::from_millis(80));

        assert!(!checker.is_expired(&e, now + Duration::from_millis(150)));
        assert!(checker.is_expired(&e, now + Duration::from_millis(180)));
    }

    #[test]
    fn test_fixed_ttl_ignores_reads_but_not_writes() {
        let checker = ExpiryChecker::new(Some(Duration::from_millis(100)), false);
        let now = Instant::now();
        let mut e = entry(None, now);

        e.touch(now + Duration::from_millis(80));
        assert!(checker.is_expired(&e, now + Duration::from_millis(150)));

        e.replace(2, None, now + Duration::from_millis(120));
        assert!(!checker.is_expired(&e, now + Duration::from_millis(150)));
        assert!(checker.is_expired(&e, now + Duration::from_millis(220)));
    }
}
