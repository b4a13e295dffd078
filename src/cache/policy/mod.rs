//! Eviction Policies
//!
//! Decide which entry to drop when the cache grows past its capacity.
//! Policies only see slot handles; they never look at keys, values or TTLs.

mod fifo;
mod lfu;
mod list;
mod lru;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::arena::SlotId;
use crate::error::CacheError;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

// == Eviction Policy Trait ==
/// Ordering structure owned by the store and kept in lockstep with its index.
///
/// Every slot passed to `on_insert` stays tracked until `on_remove` is
/// called for it, so the policy and the key index always hold the same set.
pub trait EvictionPolicy: Send + fmt::Debug {
    /// A new entry was stored in `slot`.
    fn on_insert(&mut self, slot: SlotId);

    /// The entry in `slot` was read or overwritten.
    fn on_access(&mut self, slot: SlotId);

    /// The entry in `slot` left the store for any reason.
    fn on_remove(&mut self, slot: SlotId);

    /// Next entry to evict, never returning `protected`.
    fn select_victim(&self, protected: Option<SlotId>) -> Option<SlotId>;

    /// Forgets every tracked slot.
    fn clear(&mut self);

    /// Number of tracked slots.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> EvictionPolicyKind;
}

// == Policy Kind ==
/// Selects an eviction policy at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicyKind {
    /// Least recently used
    #[default]
    Lru,
    /// First in, first out
    Fifo,
    /// Least frequently used, FIFO among equal frequencies
    Lfu,
}

impl fmt::Display for EvictionPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionPolicyKind::Lru => "lru",
            EvictionPolicyKind::Fifo => "fifo",
            EvictionPolicyKind::Lfu => "lfu",
        };
        f.write_str(name)
    }
}

impl FromStr for EvictionPolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lru" => Ok(EvictionPolicyKind::Lru),
            "fifo" => Ok(EvictionPolicyKind::Fifo),
            "lfu" => Ok(EvictionPolicyKind::Lfu),
            other => Err(CacheError::config(format!(
                "unknown eviction policy: {other}"
            ))),
        }
    }
}

// == Factory ==
/// Builds the ordering structure for `kind`.
pub fn create_policy(kind: EvictionPolicyKind) -> Box<dyn EvictionPolicy> {
    match kind {
        EvictionPolicyKind::Lru => Box::new(LruPolicy::new()),
        EvictionPolicyKind::Fifo => Box::new(FifoPolicy::new()),
        EvictionPolicyKind::Lfu => Box::new(LfuPolicy::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_and_display() {
        assert_eq!("LRU".parse::<EvictionPolicyKind>().unwrap(), EvictionPolicyKind::Lru);
        assert_eq!(" fifo ".parse::<EvictionPolicyKind>().unwrap(), EvictionPolicyKind::Fifo);
        assert_eq!("lfu".parse::<EvictionPolicyKind>().unwrap(), EvictionPolicyKind::Lfu);
        assert!(matches!(
            "arc".parse::<EvictionPolicyKind>(),
            Err(CacheError::Config(_))
        ));

        for kind in [
            EvictionPolicyKind::Lru,
            EvictionPolicyKind::Fifo,
            EvictionPolicyKind::Lfu,
        ] {
            assert_eq!(kind.to_string().parse::<EvictionPolicyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_factory_builds_requested_kind() {
        for kind in [
            EvictionPolicyKind::Lru,
            EvictionPolicyKind::Fifo,
            EvictionPolicyKind::Lfu,
        ] {
            let policy = create_policy(kind);
            assert_eq!(policy.kind(), kind);
            assert!(policy.is_empty());
        }
    }

    #[test]
    fn test_kind_serde_lowercase() {
        let json = serde_json::to_string(&EvictionPolicyKind::Lfu).unwrap();
        assert_eq!(json, "\"lfu\"");
        let kind: EvictionPolicyKind = serde_json::from_str("\"fifo\"").unwrap();
        assert_eq!(kind, EvictionPolicyKind::Fifo);
    }

    #[test]
    fn test_every_policy_honours_protected_slot() {
        for kind in [
            EvictionPolicyKind::Lru,
            EvictionPolicyKind::Fifo,
            EvictionPolicyKind::Lfu,
        ] {
            let mut policy = create_policy(kind);
            policy.on_insert(SlotId(0));
            assert_eq!(policy.select_victim(Some(SlotId(0))), None, "{kind}");
            assert_eq!(policy.select_victim(None), Some(SlotId(0)), "{kind}");
        }
    }
}
