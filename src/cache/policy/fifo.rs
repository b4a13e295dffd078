//! FIFO Policy
//!
//! Evicts in insertion order; reads never reorder.

use super::list::{ListEnds, SlotLinks};
use super::{EvictionPolicy, EvictionPolicyKind};
use crate::cache::arena::SlotId;

/// Insertion-ordered eviction. Head = oldest insert.
#[derive(Debug, Default)]
pub struct FifoPolicy {
    links: SlotLinks,
    order: ListEnds,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for FifoPolicy {
    fn on_insert(&mut self, slot: SlotId) {
        if !self.links.is_linked(slot) {
            self.links.push_back(&mut self.order, slot);
        }
    }

    fn on_access(&mut self, _slot: SlotId) {}

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
        EvictionPolicyKind::Fifo
    }
}
