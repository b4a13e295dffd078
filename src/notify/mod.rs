//! Removal Notifications
//!
//! Every entry that leaves the cache is reported exactly once, after it has
//! been detached from the store, together with the reason it left.

mod dispatcher;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

pub(crate) use dispatcher::Dispatcher;

// == Removal Cause ==
/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCause {
    /// TTL elapsed
    Expired,
    /// Dropped by the eviction policy to respect capacity
    Evicted,
    /// Value overwritten by a put on the same key
    Replaced,
    /// Removed through `remove`
    ExplicitRemoval,
    /// Dropped by `clear`
    Cleared,
}

impl RemovalCause {
    /// True for removals the caller did not ask for.
    pub fn was_evicted(&self) -> bool {
        matches!(self, RemovalCause::Expired | RemovalCause::Evicted)
    }
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemovalCause::Expired => "expired",
            RemovalCause::Evicted => "evicted",
            RemovalCause::Replaced => "replaced",
            RemovalCause::ExplicitRemoval => "explicit_removal",
            RemovalCause::Cleared => "cleared",
        };
        f.write_str(name)
    }
}

// == Removal Listener ==
/// Receives entries after they leave the cache.
///
/// Implemented for any `Fn(K, V, RemovalCause) + Send + Sync` closure.
/// A panicking listener is contained: the panic is logged and counted, and
/// the removal itself stands.
pub trait RemovalListener<K, V>: Send + Sync {
    fn on_removed(&self, key: K, value: V, cause: RemovalCause);
}

impl<K, V, F> RemovalListener<K, V> for F
where
    F: Fn(K, V, RemovalCause) + Send + Sync,
{
    fn on_removed(&self, key: K, value: V, cause: RemovalCause) {
        self(key, value, cause)
    }
}

// == Removal ==
/// A detached entry waiting to be handed to the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal<K, V> {
    pub key: K,
    pub value: V,
    pub cause: RemovalCause,
}

impl<K, V> Removal<K, V> {
    pub fn new(key: K, value: V, cause: RemovalCause) -> Self {
        Self { key, value, cause }
    }
}

// == Listener Mode ==
/// Where listener callbacks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerMode {
    /// On the calling thread, after the cache lock is released
    #[default]
    Sync,
    /// On a dedicated notification thread, in removal order
    Async,
}

impl fmt::Display for ListenerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerMode::Sync => f.write_str("sync"),
            ListenerMode::Async => f.write_str("async"),
        }
    }
}

impl FromStr for ListenerMode {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sync" => Ok(ListenerMode::Sync),
            "async" => Ok(ListenerMode::Async),
            other => Err(CacheError::config(format!("unknown listener mode: {other}"))),
        }
    }
}
