//! LRU Policy
//!
//! Implements Least Recently Used tracking for cache eviction.

use super::list::{ListEnds, SlotLinks};
use super::{EvictionPolicy, EvictionPolicyKind};
use crate::cache::arena::SlotId;

// == LRU Policy ==
/// Tracks access order for LRU eviction.
///
/// Slots are kept in an intrusive list where:
/// - Head = Least recently used
/// - Tail = Most recently used
#[derive(Debug, Default)]
pub struct LruPolicy {
    links: SlotLinks,
    order: ListEnds,
}

impl LruPolicy {
    // == Constructor ==
    /// Creates a new empty LRU policy.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a slot as most recently used, tracking it if it is new.
    pub fn touch(&mut self, slot: SlotId) {
        if self.links.is_linked(slot) {
            self.links.move_to_back(&mut self.order, slot);
        } else {
            self.links.push_back(&mut self.order, slot);
        }
    }

    // == Peek Oldest ==
    /// Returns the least recently used slot without removing it.
    pub fn peek_oldest(&self) -> Option<SlotId> {
        self.order.head
    }
}

impl EvictionPolicy for LruPolicy {
    fn on_insert(&mut self, slot: SlotId) {
        self.touch(slot);
    }

    fn on_access(&mut self, slot: SlotId) {
        self.touch(slot);
    }

    fn on_remove(&mut self, slot: SlotId) {
        self.links.unlink(&mut self.order, slot);
    }

    fn select_victim(&self, protected: Option<SlotId>) -> Option<SlotId> {
        self.links
            .iter(&self.order)
            .find(|slot| Some(*slot) != protected)
    }

    fn clear(&mut self) {
        self.links.clear();
        self.order = ListEnds::default();
    }

    fn len(&self) -> usize {
        self.order.len
    }

    fn kind(&self) -> EvictionPolicyKind {
        EvictionPolicyKind::Lru
    }
}
