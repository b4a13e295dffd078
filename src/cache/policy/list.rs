//! Intrusive Slot List
//!
//! Doubly-linked lists threaded through a side table indexed by `SlotId`.
//! One `SlotLinks` table can back several lists (LFU keeps one per
//! frequency) as long as each slot sits in at most one list at a time.

use crate::cache::arena::SlotId;

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    linked: bool,
}

// == List Ends ==
/// Head/tail bookkeeping for a single list. Head is the oldest element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListEnds {
    pub head: Option<SlotId>,
    pub tail: Option<SlotId>,
    pub len: usize,
}

impl ListEnds {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// == Slot Links ==
/// Link storage shared by all lists of one policy.
#[derive(Debug, Default)]
pub struct SlotLinks {
    links: Vec<Link>,
}

impl SlotLinks {
    fn ensure(&mut self, id: SlotId) {
        if self.links.len() <= id.0 {
            self.links.resize(id.0 + 1, Link::default());
        }
    }

    /// True if `id` currently sits in some list.
    pub fn is_linked(&self, id: SlotId) -> bool {
        self.links.get(id.0).is_some_and(|l| l.linked)
    }

    // == Push Back ==
    /// Appends `id` as the newest element of `list`.
    pub fn push_back(&mut self, list: &mut ListEnds, id: SlotId) {
        self.ensure(id);
        debug_assert!(!self.links[id.0].linked, "slot {id:?} linked twice");

        self.links[id.0] = Link {
            prev: list.tail,
            next: None,
            linked: true,
        };
        match list.tail {
            Some(tail) => self.links[tail.0].next = Some(id),
            None => list.head = Some(id),
        }
        list.tail = Some(id);
        list.len += 1;
    }

    // == Unlink ==
    /// Detaches `id` from `list`. Returns false if it was not linked.
    pub fn unlink(&mut self, list: &mut ListEnds, id: SlotId) -> bool {
        if !self.is_linked(id) {
            return false;
        }
        let Link { prev, next, .. } = self.links[id.0];

        match prev {
            Some(p) => self.links[p.0].next = next,
            None => list.head = next,
        }
        match next {
            Some(n) => self.links[n.0].prev = prev,
            None => list.tail = prev,
        }
        self.links[id.0] = Link::default();
        list.len -= 1;
        true
    }

    // == Move To Back ==
    /// Makes `id` the newest element of `list`.
    pub fn move_to_back(&mut self, list: &mut ListEnds, id: SlotId) {
        if list.tail == Some(id) {
            return;
        }
        if self.unlink(list, id) {
            self.push_back(list, id);
        }
    }

    /// Element after `id` (towards the newest end).
    pub fn next(&self, id: SlotId) -> Option<SlotId> {
        self.links.get(id.0).and_then(|l| l.next)
    }

    /// Iterates `list` from oldest to newest.
    pub fn iter<'a>(&'a self, list: &ListEnds) -> impl Iterator<Item = SlotId> + 'a {
        std::iter::successors(list.head, move |id| self.next(*id))
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }
}
