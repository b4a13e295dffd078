//! LFU Policy
//!
//! Least Frequently Used eviction with O(1) victim lookup.
//!
//! Slots are grouped into one bucket per access frequency. Buckets are
//! chained in ascending frequency order so the minimum is always the head
//! of the chain, and a promotion only ever creates the bucket directly
//! after the current one. Within a bucket slots are kept in the order they
//! arrived there, so ties go to the slot promoted to that frequency first.

use std::collections::HashMap;

use super::list::{ListEnds, SlotLinks};
use super::{EvictionPolicy, EvictionPolicyKind};
use crate::cache::arena::SlotId;

#[derive(Debug, Default)]
struct Bucket {
    slots: ListEnds,
    prev: Option<u64>,
    next: Option<u64>,
}

// == LFU Policy ==
#[derive(Debug, Default)]
pub struct LfuPolicy {
    links: SlotLinks,
    buckets: HashMap<u64, Bucket>,
    /// Frequency per slot index, 0 = untracked
    freqs: Vec<u64>,
    /// Head of the bucket chain
    min_freq: Option<u64>,
    len: usize,
}

impl LfuPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frequency of `slot`, None if it is not tracked.
    pub fn frequency(&self, slot: SlotId) -> Option<u64> {
        match self.freqs.get(slot.index()) {
            Some(0) | None => None,
            Some(freq) => Some(*freq),
        }
    }

    fn set_freq(&mut self, slot: SlotId, freq: u64) {
        if self.freqs.len() <= slot.index() {
            self.freqs.resize(slot.index() + 1, 0);
        }
        self.freqs[slot.index()] = freq;
    }

    // == Bucket Chain ==
    /// Makes sure a bucket for frequency 1 heads the chain.
    fn ensure_first_bucket(&mut self) {
        if self.buckets.contains_key(&1) {
            return;
        }
        let old_head = self.min_freq;
        if let Some(head) = old_head {
            if let Some(bucket) = self.buckets.get_mut(&head) {
                bucket.prev = Some(1);
            }
        }
        self.buckets.insert(
            1,
            Bucket {
                slots: ListEnds::default(),
                prev: None,
                next: old_head,
            },
        );
        self.min_freq = Some(1);
    }

    /// Makes sure a bucket for `freq + 1` follows the bucket for `freq`.
    fn ensure_bucket_after(&mut self, freq: u64) {
        let target = freq + 1;
        if self.buckets.contains_key(&target) {
            return;
        }
        let next = self.buckets.get(&freq).and_then(|b| b.next);
        if let Some(n) = next {
            if let Some(bucket) = self.buckets.get_mut(&n) {
                bucket.prev = Some(target);
            }
        }
        if let Some(bucket) = self.buckets.get_mut(&freq) {
            bucket.next = Some(target);
        }
        self.buckets.insert(
            target,
            Bucket {
                slots: ListEnds::default(),
                prev: Some(freq),
                next,
            },
        );
    }

    /// Drops the bucket for `freq` if it no longer holds any slot.
    fn remove_bucket_if_empty(&mut self, freq: u64) {
        let empty = self
            .buckets
            .get(&freq)
            .is_some_and(|b| b.slots.is_empty());
        if !empty {
            return;
        }
        let Some(bucket) = self.buckets.remove(&freq) else {
            return;
        };
        match bucket.prev {
            Some(p) => {
                if let Some(prev) = self.buckets.get_mut(&p) {
                    prev.next = bucket.next;
                }
            }
            None => self.min_freq = bucket.next,
        }
        if let Some(n) = bucket.next {
            if let Some(next) = self.buckets.get_mut(&n) {
                next.prev = bucket.prev;
            }
        }
    }
}

impl EvictionPolicy for LfuPolicy {
    fn on_insert(&mut self, slot: SlotId) {
        if self.frequency(slot).is_some() {
            self.on_access(slot);
            return;
        }
        self.ensure_first_bucket();
        if let Some(bucket) = self.buckets.get_mut(&1) {
            self.links.push_back(&mut bucket.slots, slot);
        }
        self.set_freq(slot, 1);
        self.len += 1;
    }

    fn on_access(&mut self, slot: SlotId) {
        let Some(freq) = self.frequency(slot) else {
            return;
        };
        if freq == u64::MAX {
            if let Some(bucket) = self.buckets.get_mut(&freq) {
                self.links.move_to_back(&mut bucket.slots, slot);
            }
            return;
        }

        self.ensure_bucket_after(freq);
        if let Some(bucket) = self.buckets.get_mut(&freq) {
            self.links.unlink(&mut bucket.slots, slot);
        }
        if let Some(bucket) = self.buckets.get_mut(&(freq + 1)) {
            self.links.push_back(&mut bucket.slots, slot);
        }
        self.set_freq(slot, freq + 1);
        self.remove_bucket_if_empty(freq);
    }

    fn on_remove(&mut self, slot: SlotId) {
        let Some(freq) = self.frequency(slot) else {
            return;
        };
        if let Some(bucket) = self.buckets.get_mut(&freq) {
            self.links.unlink(&mut bucket.slots, slot);
        }
        self.set_freq(slot, 0);
        self.len -= 1;
        self.remove_bucket_if_empty(freq);
    }

    fn select_victim(&self, protected: Option<SlotId>) -> Option<SlotId> {
        let mut freq = self.min_freq;
        while let Some(f) = freq {
            let bucket = self.buckets.get(&f)?;
            if let Some(slot) = self
                .links
                .iter(&bucket.slots)
                .find(|slot| Some(*slot) != protected)
            {
                return Some(slot);
            }
            freq = bucket.next;
        }
        None
    }

    fn clear(&mut self) {
        self.links.clear();
        self.buckets.clear();
        self.freqs.clear();
        self.min_freq = None;
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn kind(&self) -> EvictionPolicyKind {
        EvictionPolicyKind::Lfu
    }
}
