//! Cache Module
//!
//! Provides the in-memory cache engine with TTL expiration and pluggable
//! LRU/FIFO/LFU eviction.

mod arena;
mod entry;
mod expiry;
mod policy;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use arena::{SlotArena, SlotId};
pub use entry::Entry;
pub use expiry::ExpiryChecker;
pub use policy::{
    create_policy, EvictionPolicy, EvictionPolicyKind, FifoPolicy, LfuPolicy, LruPolicy,
};
pub use stats::CacheStats;
pub use store::Cache;
