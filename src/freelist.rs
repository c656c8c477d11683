//! Free-slot index (C3): a vector of free-slot head indices with a
//! lazy-delete tombstone tail.
//!
//! Ordering is not maintained; the engine's LRU-of-inserts search walks
//! the live prefix end-to-front and accepts the first entry whose head has
//! enough `free_run`. That asymmetry (append-at-end insert, scan-from-end
//! search) is what gives "last freed, first reused" for free.

/// Vector of chunk indices naming the heads of every free slot, split into
/// a live prefix `[0, len - dirty)` and a tombstone suffix `[len - dirty,
/// len)` reused by future inserts.
#[derive(Debug, Clone, Default)]
pub struct FreeSlotIndex {
    entries: Vec<u32>,
    dirty: usize,
}

impl FreeSlotIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        FreeSlotIndex {
            entries: Vec::with_capacity(capacity),
            dirty: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.entries.len() - self.dirty
    }

    /// The live prefix, in insertion order (oldest first). The engine's
    /// search walks this back-to-front for the LRU-of-inserts policy.
    #[inline]
    #[must_use]
    pub fn live(&self) -> &[u32] {
        &self.entries[..self.live_len()]
    }

    /// Insert `head` as a new live entry. Reuses a tombstone slot if one
    /// exists, otherwise appends — O(1) either way.
    pub fn insert(&mut self, head: u32) {
        if self.dirty > 0 {
            let pos = self.entries.len() - self.dirty;
            self.entries[pos] = head;
            self.dirty -= 1;
        } else {
            self.entries.push(head);
        }
    }

    /// Remove the live entry at position `p` (an index into [`Self::live`],
    /// not a chunk index). Swaps with the last live entry and tombstones
    /// the vacated tail slot — O(1), does not preserve order.
    pub fn remove_at(&mut self, p: usize) {
        let last_live = self.live_len() - 1;
        self.entries.swap(p, last_live);
        self.dirty += 1;
    }

    /// Overwrite the live entry at position `p` with `new_head` in place,
    /// without touching `dirty`. Used when an allocation's split step moves
    /// a free slot's head forward rather than removing the entry (§4.3
    /// step 7's "move the free-slot entry forward").
    pub fn replace_at(&mut self, p: usize, new_head: u32) {
        self.entries[p] = new_head;
    }

    /// Find the live-prefix position of the entry naming `head`, if any.
    /// Used by the free path's right-neighbour absorption to locate the
    /// marker at `h + len` (§4.3 free step 6, case ¬left∧right and
    /// left∧right).
    #[must_use]
    pub fn position_of(&self, head: u32) -> Option<usize> {
        self.live().iter().position(|&h| h == head)
    }

    /// Resets to the empty-pool-minus-one-slot state: one live entry at
    /// chunk 0, no tombstones. Mirrors `clear()`'s effect on `F` (§4.3).
    pub fn reset_to_single(&mut self, head: u32) {
        self.entries.clear();
        self.dirty = 0;
        self.entries.push(head);
    }

    #[cfg(any(test, feature = "diagnostics"))]
    #[must_use]
    pub fn contains(&self, head: u32) -> bool {
        self.live().contains(&head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_appends_when_no_tombstones() {
        let mut f = FreeSlotIndex::default();
        f.insert(3);
        f.insert(7);
        assert_eq!(f.live(), &[3, 7]);
    }

    #[test]
    fn remove_swaps_with_tail_and_tombstones() {
        let mut f = FreeSlotIndex::default();
        f.insert(1);
        f.insert(2);
        f.insert(3);
        f.remove_at(0);
        assert_eq!(f.live_len(), 2);
        assert_eq!(f.live(), &[3, 2]);
    }

    #[test]
    fn insert_reuses_tombstone_slot() {
        let mut f = FreeSlotIndex::default();
        f.insert(1);
        f.insert(2);
        f.remove_at(0);
        assert_eq!(f.live(), &[2]);
        f.insert(9);
        assert_eq!(f.live(), &[2, 9]);
        assert_eq!(f.entries.len(), 2);
    }

    #[test]
    fn position_of_searches_live_prefix_only() {
        let mut f = FreeSlotIndex::default();
        f.insert(1);
        f.insert(2);
        f.insert(3);
        f.remove_at(1);
        assert_eq!(f.position_of(2), None);
        assert_eq!(f.position_of(3), Some(1));
    }

    #[test]
    fn reset_to_single_clears_tombstones() {
        let mut f = FreeSlotIndex::default();
        f.insert(1);
        f.insert(2);
        f.remove_at(0);
        f.reset_to_single(0);
        assert_eq!(f.live(), &[0]);
        assert_eq!(f.dirty, 0);
    }
}
