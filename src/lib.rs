//! Mini Cache - A thread-safe in-memory cache engine
//!
//! Provides a key/value cache with TTL expiration, LRU/FIFO/LFU eviction,
//! removal notifications and an optional background pruner.

pub mod cache;
pub mod config;
pub mod error;
pub mod notify;
pub mod tasks;

pub use cache::{Cache, CacheStats, EvictionPolicyKind};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use notify::{ListenerMode, Removal, RemovalCause, RemovalListener};
pub use tasks::BackgroundPruner;
