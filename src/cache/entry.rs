//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL bookkeeping.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached key/value pair plus its access metadata.
///
/// Entries live only inside the store's arena. Callers never receive a
/// reference to one, only clones of the value.
#[derive(Debug, Clone)]
pub struct Entry<K, V> {
    /// The key this entry is indexed under
    pub key: K,
    /// The stored value
    pub value: V,
    /// When the entry was first inserted
    pub created_at: Instant,
    /// When the value was last written (insert or replace)
    pub updated_at: Instant,
    /// When the entry was last read or written
    pub last_accessed_at: Instant,
    /// Per-entry TTL override, None = use the cache default
    pub ttl: Option<Duration>,
    /// Number of reads and writes since insertion
    pub access_count: u64,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates a new entry stamped with `now`.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `value` - The value to store
    /// * `ttl` - Optional per-entry TTL override
    /// * `now` - Creation instant
    pub fn new(key: K, value: V, ttl: Option<Duration>, now: Instant) -> Self {
        Self {
            key,
            value,
            created_at: now,
            updated_at: now,
            last_accessed_at: now,
            ttl,
            access_count: 1,
        }
    }

    // == Touch ==
    /// Records a read at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_accessed_at = now;
        self.access_count = self.access_count.saturating_add(1);
    }

    // == Replace ==
    /// Swaps in a new value and TTL, returning the previous value.
    ///
    /// A write counts as an access and restarts the fixed TTL window.
    pub fn replace(&mut self, value: V, ttl: Option<Duration>, now: Instant) -> V {
        self.ttl = ttl;
        self.updated_at = now;
        self.touch(now);
        std::mem::replace(&mut self.value, value)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = Entry::new("k", "v", None, now);

        assert_eq!(entry.key, "k");
        assert_eq!(entry.value, "v");
        assert_eq!(entry.created_at, now);
        assert_eq!(entry.last_accessed_at, now);
        assert!(entry.ttl.is_none());
        assert_eq!(entry.access_count, 1);
    }

    #[test]
    fn test_touch_updates_access_metadata() {
        let now = Instant::now();
        let mut entry = Entry::new(1, 10, Some(Duration::from_secs(5)), now);

        let later = now + Duration::from_millis(50);
        entry.touch(later);

        assert_eq!(entry.last_accessed_at, later);
        assert_eq!(entry.created_at, now);
        assert_eq!(entry.access_count, 2);
    }

    #[test]
    fn test_replace_returns_old_value() {
        let now = Instant::now();
        let mut entry = Entry::new(1, "old".to_string(), None, now);

        let later = now + Duration::from_millis(10);
        let old = entry.replace("new".to_string(), Some(Duration::from_secs(1)), later);

        assert_eq!(old, "old");
        assert_eq!(entry.value, "new");
        assert_eq!(entry.ttl, Some(Duration::from_secs(1)));
        assert_eq!(entry.created_at, now);
        assert_eq!(entry.updated_at, later);
        assert_eq!(entry.last_accessed_at, later);
    }
}
