//! Cache Store Module
//!
//! Main cache engine combining an entry arena, a key index, a pluggable
//! eviction policy and TTL expiration behind a single lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{
    create_policy, CacheStats, Entry, EvictionPolicy, EvictionPolicyKind, ExpiryChecker, SlotArena,
    SlotId,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::notify::{Dispatcher, Removal, RemovalCause, RemovalListener};

// == Pending Removals ==
/// Removals detached during one locked operation.
///
/// Whether a listener is installed is read once, under the lock, so every
/// removal of the operation is either reported or dropped together.
struct Pending<K, V> {
    wanted: bool,
    removals: Vec<Removal<K, V>>,
}

impl<K, V> Pending<K, V> {
    fn new(wanted: bool) -> Self {
        Self {
            wanted,
            removals: Vec::new(),
        }
    }

    /// True if a listener will see what is pushed here.
    fn wanted(&self) -> bool {
        self.wanted
    }

    fn push(&mut self, removal: Removal<K, V>) {
        if self.wanted {
            self.removals.push(removal);
        }
    }
}

// == Inner State ==
/// Everything guarded by the cache lock.
///
/// The key index, the arena and the policy are only ever changed together
/// inside one lock scope, so no other thread can see them disagree.
#[derive(Debug)]
struct Inner<K, V> {
    /// Entry storage
    entries: SlotArena<Entry<K, V>>,
    /// Key to slot lookup
    index: HashMap<K, SlotId>,
    /// Eviction ordering over the same slots
    policy: Box<dyn EvictionPolicy>,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> Inner<K, V>
where
    K: Hash + Eq,
{
    // == Detach ==
    /// Removes `slot` from the arena, the index and the policy in one step.
    fn detach(&mut self, slot: SlotId) -> Option<Entry<K, V>> {
        let entry = self.entries.remove(slot)?;
        self.index.remove(&entry.key);
        self.policy.on_remove(slot);
        Some(entry)
    }

    // == Live Slot ==
    /// Looks up `key`, expiring it first if its TTL has elapsed.
    fn live_slot<Q>(
        &mut self,
        key: &Q,
        now: Instant,
        expiry: &ExpiryChecker,
        pending: &mut Pending<K, V>,
    ) -> Option<SlotId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        let expired = self
            .entries
            .get(slot)
            .is_some_and(|entry| expiry.is_expired(entry, now));
        if !expired {
            return Some(slot);
        }

        if let Some(entry) = self.detach(slot) {
            self.stats.record_removal(RemovalCause::Expired);
            pending.push(Removal::new(entry.key, entry.value, RemovalCause::Expired));
        }
        None
    }

    // == Evict Overflow ==
    /// Evicts until the cache fits `capacity`, never touching `protected`.
    fn evict_overflow(&mut self, capacity: usize, protected: SlotId, pending: &mut Pending<K, V>) {
        if capacity == 0 {
            return;
        }
        while self.entries.len() > capacity {
            let Some(victim) = self.policy.select_victim(Some(protected)) else {
                warn!(
                    len = self.entries.len(),
                    capacity, "Eviction policy returned no victim"
                );
                break;
            };
            let Some(entry) = self.detach(victim) else {
                warn!(slot = victim.index(), "Eviction victim missing from store");
                break;
            };
            self.stats.record_removal(RemovalCause::Evicted);
            pending.push(Removal::new(entry.key, entry.value, RemovalCause::Evicted));
        }
    }

    // == Prune ==
    fn prune(&mut self, now: Instant, expiry: &ExpiryChecker, pending: &mut Pending<K, V>) -> usize {
        let expired: Vec<SlotId> = self
            .entries
            .iter()
            .filter(|(_, entry)| expiry.is_expired(entry, now))
            .map(|(slot, _)| slot)
            .collect();

        for slot in &expired {
            if let Some(entry) = self.detach(*slot) {
                self.stats.record_removal(RemovalCause::Expired);
                pending.push(Removal::new(entry.key, entry.value, RemovalCause::Expired));
            }
        }
        expired.len()
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        assert_eq!(self.index.len(), self.entries.len(), "index/arena size mismatch");
        assert_eq!(self.policy.len(), self.entries.len(), "policy/arena size mismatch");
        for (key, slot) in &self.index {
            let entry = self.entries.get(*slot).expect("index points at a vacant slot");
            assert!(entry.key == *key, "index points at another key's slot");
        }
    }
}

// == Cache ==
/// Thread-safe in-memory cache with capacity eviction and TTL expiry.
///
/// Share it between threads with an `Arc`. Every operation takes the lock
/// for one bounded step; removal listeners always run after it is released.
///
/// ```
/// use std::time::Duration;
/// use mini_cache::{Cache, EvictionPolicyKind};
///
/// let cache = Cache::new(2, Some(Duration::from_secs(60)), EvictionPolicyKind::Lru).unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.get(&"a");
/// cache.put("c", 3);
///
/// assert_eq!(cache.get(&"b"), None);
/// assert_eq!(cache.get(&"a"), Some(1));
/// ```
pub struct Cache<K, V> {
    inner: Mutex<Inner<K, V>>,
    expiry: ExpiryChecker,
    config: CacheConfig,
    dispatcher: Dispatcher<K, V>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a cache with the given capacity (0 = unbounded), default TTL
    /// and eviction policy. Other settings take their defaults.
    pub fn new(
        capacity: usize,
        default_ttl: Option<Duration>,
        policy: EvictionPolicyKind,
    ) -> Result<Self> {
        let mut config = CacheConfig::new(capacity).with_eviction_policy(policy);
        config.default_ttl = default_ttl;
        Self::with_config(config)
    }

    /// Creates a cache from a full configuration.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let dispatcher = Dispatcher::new(config.listener_mode)?;
        let inner = Inner {
            entries: SlotArena::with_capacity(config.capacity.min(1024)),
            index: HashMap::new(),
            policy: create_policy(config.eviction_policy),
            stats: CacheStats::new(),
        };
        debug!(
            capacity = config.capacity,
            policy = %config.eviction_policy,
            listener_mode = %config.listener_mode,
            "Cache created"
        );

        Ok(Self {
            inner: Mutex::new(inner),
            expiry: ExpiryChecker::new(config.default_ttl, config.ttl_refresh_on_access),
            config,
            dispatcher,
        })
    }

    /// Runs `op` under the lock, then delivers whatever it detached.
    fn locked<R>(&self, op: impl FnOnce(&mut Inner<K, V>, &mut Pending<K, V>) -> R) -> R {
        let (result, owed) = {
            let mut inner = self.inner.lock();
            let mut pending = Pending::new(self.dispatcher.has_listener());
            let result = op(&mut *inner, &mut pending);
            let len = inner.entries.len();
            inner.stats.set_total_entries(len);
            (result, self.dispatcher.hand_off(pending.removals))
        };
        self.dispatcher.deliver(owed);
        result
    }

    // == Get ==
    /// Returns a clone of the live value for `key`.
    ///
    /// Counts as an access: refreshes recency, frequency and the sliding TTL.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locked(|inner, pending| {
            let now = Instant::now();
            let Some(slot) = inner.live_slot(key, now, &self.expiry, pending) else {
                inner.stats.record_miss();
                return None;
            };
            let entry = inner.entries.get_mut(slot)?;
            entry.touch(now);
            let value = entry.value.clone();
            inner.policy.on_access(slot);
            inner.stats.record_hit();
            Some(value)
        })
    }

    // == Peek ==
    /// Returns a clone of the live value without counting it as an access.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locked(|inner, pending| {
            let slot = inner.live_slot(key, Instant::now(), &self.expiry, pending)?;
            inner.entries.get(slot).map(|entry| entry.value.clone())
        })
    }

    // == Contains Key ==
    /// True if a live entry exists for `key`. Does not count as an access.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locked(|inner, pending| {
            inner
                .live_slot(key, Instant::now(), &self.expiry, pending)
                .is_some()
        })
    }

    // == Put ==
    /// Stores `value` under `key` using the cache's default TTL.
    ///
    /// Returns the previous live value, which is reported to the listener as
    /// `Replaced`. Inserting a new key may evict others to respect capacity.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.insert(key, value, None)
    }

    /// Stores `value` under `key` with its own TTL.
    ///
    /// A zero TTL is rejected before the cache is touched.
    pub fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<Option<V>> {
        if ttl.is_zero() {
            return Err(CacheError::config("entry ttl must be greater than zero"));
        }
        Ok(self.insert(key, value, Some(ttl)))
    }

    fn insert(&self, key: K, value: V, ttl: Option<Duration>) -> Option<V> {
        let capacity = self.config.capacity;

        self.locked(|inner, pending| {
            let now = Instant::now();

            if let Some(slot) = inner.live_slot(&key, now, &self.expiry, pending) {
                let entry = inner.entries.get_mut(slot)?;
                let old = entry.replace(value, ttl, now);
                inner.policy.on_access(slot);
                inner.stats.record_removal(RemovalCause::Replaced);
                if pending.wanted() {
                    pending.push(Removal::new(key, old.clone(), RemovalCause::Replaced));
                }
                return Some(old);
            }

            let slot = inner.entries.insert(Entry::new(key.clone(), value, ttl, now));
            inner.index.insert(key, slot);
            inner.policy.on_insert(slot);
            inner.evict_overflow(capacity, slot, pending);
            None
        })
    }

    // == Remove ==
    /// Removes `key` whether or not its TTL has elapsed.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locked(|inner, pending| {
            let slot = *inner.index.get(key)?;
            let entry = inner.detach(slot)?;
            inner.stats.record_removal(RemovalCause::ExplicitRemoval);
            if pending.wanted() {
                pending.push(Removal::new(
                    entry.key,
                    entry.value.clone(),
                    RemovalCause::ExplicitRemoval,
                ));
            }
            Some(entry.value)
        })
    }

    // == Clear ==
    /// Removes every entry, notifying once per entry with `Cleared`.
    pub fn clear(&self) {
        let cleared = self.locked(|inner, pending| {
            inner.index.clear();
            inner.policy.clear();
            let mut count = 0usize;
            for entry in inner.entries.drain() {
                count += 1;
                pending.push(Removal::new(entry.key, entry.value, RemovalCause::Cleared));
            }
            for _ in 0..count {
                inner.stats.record_removal(RemovalCause::Cleared);
            }
            count
        });
        debug!(cleared, "Cache cleared");
    }

    // == Prune ==
    /// Removes every entry whose TTL has elapsed at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self, now: Instant) -> usize {
        self.locked(|inner, pending| inner.prune(now, &self.expiry, pending))
    }

    /// Prunes against the current time.
    pub fn prune_now(&self) -> usize {
        self.prune(Instant::now())
    }

    // == Remaining TTL ==
    /// Time until the live entry for `key` expires, None if absent or immortal.
    pub fn remaining_ttl<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locked(|inner, pending| {
            let now = Instant::now();
            let slot = inner.live_slot(key, now, &self.expiry, pending)?;
            inner
                .entries
                .get(slot)
                .and_then(|entry| self.expiry.remaining(entry, now))
        })
    }

    // == Listener ==
    /// Installs the removal listener, replacing any previous one.
    pub fn set_removal_listener<L>(&self, listener: L)
    where
        L: RemovalListener<K, V> + 'static,
    {
        self.dispatcher.set_listener(Arc::new(listener));
    }

    pub fn clear_removal_listener(&self) {
        self.dispatcher.clear_listener();
    }

    // == Size ==
    /// Number of stored entries, including expired ones not yet pruned.
    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = {
            let inner = self.inner.lock();
            let mut stats = inner.stats.clone();
            stats.set_total_entries(inner.entries.len());
            stats
        };
        stats.listener_failures = self.dispatcher.failures();
        stats
    }

    /// Maximum number of live entries, 0 = unbounded.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn policy(&self) -> EvictionPolicyKind {
        self.config.eviction_policy
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.inner.lock().assert_consistent();
    }
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
