//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against its invariants and a simple
//! reference model.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::cache::{Cache, EvictionPolicyKind};
use crate::notify::RemovalCause;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;

// == Strategies ==
/// Generates cache keys from a small space so operations collide often
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..32
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}"
}

fn policy_strategy() -> impl Strategy<Value = EvictionPolicyKind> {
    prop_oneof![
        Just(EvictionPolicyKind::Lru),
        Just(EvictionPolicyKind::Fifo),
        Just(EvictionPolicyKind::Lfu),
    ]
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: String },
    Get { key: u8 },
    Remove { key: u8 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

fn unique(keys: Vec<u8>) -> Vec<u8> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(*k)).collect()
}

type Log = Arc<Mutex<Vec<(u8, String, RemovalCause)>>>;

fn recorded(cache: &Cache<u8, String>) -> Log {
    let log: Log = Arc::default();
    let sink = Arc::clone(&log);
    cache.set_removal_listener(move |k: u8, v: String, cause: RemovalCause| {
        sink.lock().push((k, v, cause));
    });
    log
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hits and misses reflect exactly the gets that found or missed a value.
    #[test]
    fn prop_statistics_accuracy(
        policy in policy_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let store: Cache<u8, String> = Cache::new(8, None, policy).unwrap();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key, value);
                }
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Remove { key } => {
                    store.remove(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.size(), "Total entries mismatch");
    }

    // Storing then reading before expiry returns the stored value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let store: Cache<u8, String> =
            Cache::new(TEST_MAX_ENTRIES, None, EvictionPolicyKind::Lru).unwrap();

        store.put(key, value.clone());
        prop_assert_eq!(store.get(&key), Some(value));
    }

    // Size never exceeds capacity, and index, arena and policy always agree.
    #[test]
    fn prop_capacity_and_bijection(
        policy in policy_strategy(),
        capacity in 1usize..10,
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let store: Cache<u8, String> = Cache::new(capacity, None, policy).unwrap();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key, value);
                    // the key just written is always present afterwards
                    prop_assert!(store.contains_key(&key));
                }
                CacheOp::Get { key } => {
                    store.get(&key);
                }
                CacheOp::Remove { key } => {
                    store.remove(&key);
                }
            }
            prop_assert!(
                store.size() <= capacity,
                "Cache size {} exceeds max {}",
                store.size(),
                capacity
            );
            store.assert_consistent();
        }
    }

    // Every entry that leaves the cache is reported exactly once.
    #[test]
    fn prop_notifications_exactly_once(
        policy in policy_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..150)
    ) {
        let store: Cache<u8, String> = Cache::new(6, None, policy).unwrap();
        let log = recorded(&store);
        let mut inserted = 0usize;
        let mut replaced = 0usize;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => match store.put(key, value) {
                    Some(_) => replaced += 1,
                    None => inserted += 1,
                },
                CacheOp::Get { key } => {
                    store.get(&key);
                }
                CacheOp::Remove { key } => {
                    store.remove(&key);
                }
            }
        }
        store.clear();

        let log = log.lock();
        let replacements = log.iter().filter(|e| e.2 == RemovalCause::Replaced).count();
        let departures = log.len() - replacements;
        prop_assert_eq!(replacements, replaced);
        prop_assert_eq!(departures, inserted, "every inserted entry leaves exactly once");
    }

    // The cache matches a naive recency-list model under LRU.
    #[test]
    fn prop_lru_matches_reference_model(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..150)
    ) {
        let store: Cache<u8, String> = Cache::new(capacity, None, EvictionPolicyKind::Lru).unwrap();
        // oldest first
        let mut order: Vec<u8> = Vec::new();
        let mut values: HashMap<u8, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let expected_old = values.insert(key, value.clone());
                    order.retain(|k| *k != key);
                    order.push(key);
                    if order.len() > capacity {
                        let victim = order.remove(0);
                        values.remove(&victim);
                    }
                    prop_assert_eq!(store.put(key, value), expected_old);
                }
                CacheOp::Get { key } => {
                    let expected = values.get(&key).cloned();
                    if expected.is_some() {
                        order.retain(|k| *k != key);
                        order.push(key);
                    }
                    prop_assert_eq!(store.get(&key), expected);
                }
                CacheOp::Remove { key } => {
                    order.retain(|k| *k != key);
                    prop_assert_eq!(store.remove(&key), values.remove(&key));
                }
            }
        }
        prop_assert_eq!(store.size(), values.len());
    }

    // Filling to capacity then inserting a new key evicts the oldest under
    // LRU unless it was read, and always evicts it under FIFO.
    #[test]
    fn prop_lru_and_fifo_eviction_order(
        keys in prop::collection::vec(key_strategy(), 3..12),
        touch_oldest in any::<bool>(),
        fifo in any::<bool>()
    ) {
        let keys = unique(keys);
        prop_assume!(keys.len() >= 3);
        let new_key = keys[keys.len() - 1];
        let initial = &keys[..keys.len() - 1];

        let policy = if fifo { EvictionPolicyKind::Fifo } else { EvictionPolicyKind::Lru };
        let store: Cache<u8, String> = Cache::new(initial.len(), None, policy).unwrap();
        let log = recorded(&store);

        for key in initial {
            store.put(*key, format!("value_{}", key));
        }
        if touch_oldest {
            store.get(&initial[0]);
        }
        store.put(new_key, "new".to_string());

        let expected_victim = if touch_oldest && !fifo { initial[1] } else { initial[0] };
        let log = log.lock();
        prop_assert_eq!(log.len(), 1);
        prop_assert_eq!(log[0].0, expected_victim);
        prop_assert_eq!(log[0].2, RemovalCause::Evicted);
        prop_assert!(store.contains_key(&new_key));
        prop_assert_eq!(store.size(), initial.len());
    }

    // Overwriting live keys never evicts anything.
    #[test]
    fn prop_replacement_is_not_eviction(
        policy in policy_strategy(),
        keys in prop::collection::vec(key_strategy(), 1..10),
        rewrites in prop::collection::vec(0usize..10, 1..30)
    ) {
        let keys = unique(keys);
        let store: Cache<u8, String> = Cache::new(keys.len(), None, policy).unwrap();
        let log = recorded(&store);

        for key in &keys {
            store.put(*key, "first".to_string());
        }
        for index in rewrites {
            let key = keys[index % keys.len()];
            prop_assert!(store.put(key, "again".to_string()).is_some());
        }

        prop_assert_eq!(store.size(), keys.len());
        prop_assert!(log.lock().iter().all(|e| e.2 == RemovalCause::Replaced));
        prop_assert_eq!(store.stats().evictions, 0);
    }
}

// == Concurrent Operation Correctness ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Reads racing writes only ever see values some writer produced, and the
    // structure is consistent once all threads are done.
    #[test]
    fn prop_concurrent_operation_correctness(
        policy in policy_strategy(),
        threads in prop::collection::vec(
            prop::collection::vec(cache_op_strategy(), 10..60),
            2..6
        )
    ) {
        let store: Arc<Cache<u8, String>> = Arc::new(Cache::new(8, None, policy).unwrap());
        let written: Arc<Mutex<HashSet<String>>> = Arc::default();

        // Record every value before it can become visible
        for ops in &threads {
            for op in ops {
                if let CacheOp::Put { value, .. } = op {
                    written.lock().insert(value.clone());
                }
            }
        }

        let handles: Vec<_> = threads
            .into_iter()
            .map(|ops| {
                let store = Arc::clone(&store);
                let written = Arc::clone(&written);
                thread::spawn(move || -> Result<(), String> {
                    for op in ops {
                        match op {
                            CacheOp::Put { key, value } => {
                                store.put(key, value);
                            }
                            CacheOp::Get { key } => {
                                if let Some(value) = store.get(&key) {
                                    if !written.lock().contains(&value) {
                                        return Err(format!("read unknown value {value:?}"));
                                    }
                                }
                            }
                            CacheOp::Remove { key } => {
                                store.remove(&key);
                            }
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            let result = handle.join().expect("worker should not panic");
            prop_assert!(result.is_ok(), "Concurrent operation failed: {:?}", result);
        }

        prop_assert!(store.size() <= 8, "Cache should not exceed max entries");
        store.assert_consistent();
    }
}
