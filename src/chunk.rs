//! Chunk table (C1): the dense per-chunk record array.

/// One chunk's bookkeeping record.
///
/// `index` duplicates the record's position in [`ChunkTable`]'s backing
/// vector. That's load-bearing, not decorative: [`crate::freelist::FreeSlotIndex`]
/// stores these indices directly and the engine recovers a chunk's own
/// position from a handle without needing the table in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRecord {
    pub index: u32,
    pub used: bool,
    /// Slot length in chunks, set only on the head of a used slot.
    pub used_chunks: u32,
    /// Contiguous free run starting here, set only on the head of a free
    /// slot.
    pub free_run: u32,
}

impl ChunkRecord {
    const fn new(index: u32) -> Self {
        ChunkRecord {
            index,
            used: false,
            used_chunks: 0,
            free_run: 0,
        }
    }

    /// `used ∧ used_chunks > 0` — the head predicate fixed by the spec's
    /// Open Question (c): several revisions disagreed, this is the one
    /// the rest of the engine depends on.
    #[inline]
    #[must_use]
    pub const fn is_used_head(&self) -> bool {
        self.used && self.used_chunks > 0
    }

    /// `free_run > 0` marks a chunk as the head of a free slot.
    #[inline]
    #[must_use]
    pub const fn is_free_head(&self) -> bool {
        self.free_run > 0
    }
}

/// The dense chunk-record array, one entry per chunk, index `i` owning
/// bytes `[i * chunk_size, (i + 1) * chunk_size)` of the [`crate::buffer::RawBuffer`].
#[derive(Debug, Clone)]
pub struct ChunkTable {
    records: Vec<ChunkRecord>,
}

impl ChunkTable {
    /// All chunks free, a single free slot at head 0 spanning the whole
    /// table — the pool's post-construction (and post-`clear`) state.
    pub fn new(chunk_count: u32) -> Self {
        let mut records: Vec<ChunkRecord> = (0..chunk_count).map(ChunkRecord::new).collect();
        if let Some(head) = records.first_mut() {
            head.free_run = chunk_count;
        }
        ChunkTable { records }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.records.len() as u32
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: u32) -> &ChunkRecord {
        &self.records[index as usize]
    }

    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, index: u32) -> &mut ChunkRecord {
        &mut self.records[index as usize]
    }

    /// Resets every record to the post-construction state. See
    /// [`ChunkTable::new`] for the invariant it restores.
    pub fn reset(&mut self) {
        let count = self.len();
        for (i, record) in self.records.iter_mut().enumerate() {
            *record = ChunkRecord::new(i as u32);
        }
        if let Some(head) = self.records.first_mut() {
            head.free_run = count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_has_single_free_head() {
        let table = ChunkTable::new(10);
        assert_eq!(table.len(), 10);
        assert_eq!(table.get(0).free_run, 10);
        for i in 1..10 {
            assert_eq!(table.get(i).free_run, 0);
            assert!(!table.get(i).used);
        }
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut table = ChunkTable::new(5);
        table.get_mut(0).used = true;
        table.get_mut(0).used_chunks = 2;
        table.get_mut(0).free_run = 0;
        table.get_mut(2).free_run = 3;
        table.reset();
        assert_eq!(table.get(0).free_run, 5);
        assert!(!table.get(0).used);
    }

    #[test]
    fn head_predicates() {
        let mut table = ChunkTable::new(4);
        assert!(table.get(0).is_free_head());
        assert!(!table.get(0).is_used_head());
        table.get_mut(0).used = true;
        table.get_mut(0).used_chunks = 1;
        table.get_mut(0).free_run = 0;
        assert!(table.get(0).is_used_head());
    }
}
