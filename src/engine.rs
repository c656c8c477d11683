//! Allocator engine (C4): slot search, split, free, coalesce.
//!
//! Single-threaded core. [`crate::pool::ChunkPool`] is the only caller and
//! serialises access through a mutex; nothing in here is `Sync` on its own.

use crate::buffer::RawBuffer;
use crate::chunk::ChunkTable;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::freelist::FreeSlotIndex;
use crate::handle::{Handle, PoolId};

#[cfg(feature = "logging")]
macro_rules! log_trace { ($($arg:tt)*) => { tracing::trace!($($arg)*) }; }
#[cfg(not(feature = "logging"))]
macro_rules! log_trace { ($($arg:tt)*) => {}; }

#[cfg(feature = "logging")]
macro_rules! log_warn { ($($arg:tt)*) => { tracing::warn!($($arg)*) }; }
#[cfg(not(feature = "logging"))]
macro_rules! log_warn { ($($arg:tt)*) => {}; }

#[cfg(feature = "logging")]
macro_rules! log_error { ($($arg:tt)*) => { tracing::error!($($arg)*) }; }
#[cfg(not(feature = "logging"))]
macro_rules! log_error { ($($arg:tt)*) => {}; }

/// Cumulative counters, tracked only when [`PoolConfig::track_stats`] is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_allocs: u64,
    pub total_frees: u64,
    pub failed_allocs: u64,
    pub peak_used_chunks: u32,
}

/// The chunk-management core: owns the chunk table, raw buffer, and
/// free-slot index, and implements `alloc`/`free`/`clear` plus queries.
pub struct Engine {
    pool_id: PoolId,
    chunk_size: usize,
    table: ChunkTable,
    buffer: RawBuffer,
    free_list: FreeSlotIndex,
    config: PoolConfig,
    stats: Stats,
}

impl Engine {
    pub fn new(pool_id: PoolId, chunk_size: usize, chunk_count: usize, config: PoolConfig) -> PoolResult<Self> {
        if chunk_size == 0 {
            return Err(PoolError::InvalidRequest {
                reason: "chunk_size must be non-zero",
            });
        }
        if chunk_count == 0 {
            return Err(PoolError::InvalidRequest {
                reason: "chunk_count must be non-zero",
            });
        }
        let pool_size = chunk_size
            .checked_mul(chunk_count)
            .ok_or(PoolError::InvalidRequest {
                reason: "chunk_size * chunk_count overflows usize",
            })?;
        if pool_size > config.max_pool_bytes {
            return Err(PoolError::InvalidRequest {
                reason: "chunk_size * chunk_count exceeds max_pool_bytes",
            });
        }

        let mut free_list = FreeSlotIndex::with_capacity((chunk_count / 5).max(1));
        free_list.insert(0);

        log_trace!(pool_id, chunk_size, chunk_count, "pool constructed");

        Ok(Engine {
            pool_id,
            chunk_size,
            table: ChunkTable::new(chunk_count as u32),
            buffer: RawBuffer::new(chunk_size, chunk_count),
            free_list,
            config,
            stats: Stats::default(),
        })
    }

    // ---- queries -----------------------------------------------------

    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn chunk_count(&self) -> u32 {
        self.table.len()
    }

    #[must_use]
    pub fn free_chunks(&self) -> u32 {
        self.free_list
            .live()
            .iter()
            .map(|&h| self.table.get(h).free_run)
            .sum()
    }

    #[must_use]
    pub fn used_chunks(&self) -> u32 {
        self.chunk_count() - self.free_chunks()
    }

    /// Size in chunks of the largest free run, or 0 if the pool is full.
    /// Not named in spec.md's minimal query surface but promoted to a real
    /// method since `OutOfSpace` diagnostics (and the dump formatter) need
    /// it; see SPEC_FULL.md §3.
    #[must_use]
    pub fn largest_free_run(&self) -> u32 {
        self.free_list
            .live()
            .iter()
            .map(|&h| self.table.get(h).free_run)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub(crate) fn table(&self) -> &ChunkTable {
        &self.table
    }

    pub(crate) fn buffer(&self) -> &RawBuffer {
        &self.buffer
    }

    pub(crate) fn free_list(&self) -> &FreeSlotIndex {
        &self.free_list
    }

    pub(crate) fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Raw pointer to chunk `index`'s bytes. Caller has already resolved a
    /// handle against this engine; out-of-range indices panic.
    #[must_use]
    pub fn chunk_data_ptr(&self, index: u32) -> *const u8 {
        assert!(index < self.chunk_count(), "chunk index out of range");
        self.buffer.chunk_ptr(index)
    }

    // ---- mutating operations ------------------------------------------

    /// §4.3 `alloc(bytes)`.
    pub fn alloc(&mut self, bytes: usize) -> PoolResult<Handle> {
        if bytes == 0 {
            return Err(PoolError::InvalidRequest {
                reason: "alloc of zero bytes",
            });
        }
        let need = ((bytes + self.chunk_size - 1) / self.chunk_size) as u32;

        let live_len = self.free_list.live_len();
        let mut found_pos: Option<usize> = None;
        let mut largest = 0u32;
        // LRU-of-inserts: scan from the most-recently-inserted end.
        for p in (0..live_len).rev() {
            let head = self.free_list.live()[p];
            let free_run = self.table.get(head).free_run;
            if free_run > largest {
                largest = free_run;
            }
            if free_run >= need {
                found_pos = Some(p);
                break;
            }
        }

        let p = match found_pos {
            Some(p) => p,
            None => {
                self.stats.failed_allocs += 1;
                log_warn!(need, largest, "pool out of space");
                return Err(PoolError::OutOfSpace {
                    requested_chunks: need,
                    largest_free_run: largest,
                });
            }
        };

        let head = self.free_list.live()[p];
        let head_record = *self.table.get(head);
        debug_assert!(!head_record.used, "free-slot head marked used");
        let head_free_run = head_record.free_run;

        {
            let head_rec = self.table.get_mut(head);
            head_rec.used = true;
            head_rec.used_chunks = need;
        }
        if need > 1 {
            let tail_index = head + need - 1;
            let tail_rec = self.table.get_mut(tail_index);
            tail_rec.used = true;
            tail_rec.used_chunks = 0;
        }

        let next = head + need;
        if next < self.table.len() && !self.table.get(next).used {
            self.table.get_mut(next).free_run = head_free_run - need;
            self.free_list.replace_at(p, next);
        } else {
            self.free_list.remove_at(p);
        }
        self.table.get_mut(head).free_run = 0;

        if let Some(pattern) = self.config.alloc_pattern {
            self.buffer.fill_chunks(head, need, pattern);
        }
        if self.config.track_stats {
            self.stats.total_allocs += 1;
            let used = self.used_chunks();
            if used > self.stats.peak_used_chunks {
                self.stats.peak_used_chunks = used;
            }
        }

        log_trace!(head, need, "allocated");
        Ok(Handle::new(self.pool_id, head, need))
    }

    /// §4.3 `free(handle)`.
    pub fn free(&mut self, handle: Handle) -> PoolResult<()> {
        if handle.pool_id() != self.pool_id {
            log_error!("free: handle belongs to a different pool");
            return Err(PoolError::InvalidFree {
                reason: "handle belongs to a different pool",
            });
        }
        let h = handle.chunk_index();
        if h >= self.table.len() {
            log_error!(h, "free: chunk index out of bounds");
            return Err(PoolError::InvalidFree {
                reason: "chunk index out of bounds",
            });
        }

        let head_record = *self.table.get(h);
        if !head_record.used || head_record.used_chunks == 0 {
            log_error!(h, "free: handle does not reference a used slot head");
            return Err(PoolError::InvalidFree {
                reason: "handle does not reference a used slot head (double free or foreign handle)",
            });
        }

        let len = head_record.used_chunks;
        let last_index = h + len - 1;
        let chunk_count = self.table.len();

        if let Some(pattern) = self.config.dealloc_pattern {
            self.buffer.fill_chunks(h, len, pattern);
        }

        self.table.get_mut(h).used = false;
        if last_index != h {
            self.table.get_mut(last_index).used = false;
        }

        let right_free = h + len < chunk_count && self.table.get(h + len).free_run > 0;
        let left_free = h > 0 && !self.table.get(h - 1).used;

        match (left_free, right_free) {
            (false, false) => {
                self.free_list.insert(h);
                self.table.get_mut(h).free_run = len;
            }
            (false, true) => {
                let right_head = h + len;
                let right_run = self.table.get(right_head).free_run;
                let p = self.position_of_or_invariant_violation(right_head);
                // Tombstone the absorbed marker and re-insert the merged
                // head rather than overwriting in place, so the
                // LRU-of-inserts search treats this slot as freshly
                // freed (§4.3 scenario 5: "last-inserted-first policy").
                self.free_list.remove_at(p);
                self.free_list.insert(h);
                self.table.get_mut(h).free_run = len + right_run;
                self.table.get_mut(right_head).free_run = 0;
            }
            (true, false) => {
                let l = self.find_left_free_head(h);
                self.table.get_mut(l).free_run += len;
            }
            (true, true) => {
                let right_head = h + len;
                let right_run = self.table.get(right_head).free_run;
                let p = self.position_of_or_invariant_violation(right_head);
                self.free_list.remove_at(p);
                let l = self.find_left_free_head(h);
                self.table.get_mut(l).free_run += len + right_run;
                self.table.get_mut(right_head).free_run = 0;
            }
        }

        self.table.get_mut(h).used_chunks = 0;
        if self.config.track_stats {
            self.stats.total_frees += 1;
        }
        log_trace!(h, len, "freed");
        Ok(())
    }

    /// §4.3 `clear()`.
    pub fn clear(&mut self) {
        self.table.reset();
        self.free_list.reset_to_single(0);
        log_trace!("pool cleared");
    }

    fn position_of_or_invariant_violation(&self, head: u32) -> usize {
        match self.free_list.position_of(head) {
            Some(p) => p,
            None => self.invariant_violation(
                "free-neighbour chunk has free_run > 0 but no entry in the free-slot index",
            ),
        }
    }

    /// §4.3 "scan chunks backward ... until ... a chunk marked as
    /// free-slot head is found".
    fn find_left_free_head(&self, h: u32) -> u32 {
        let mut i = h - 1;
        while i > 0 && !self.table.get(i).is_free_head() {
            i -= 1;
        }
        i
    }

    fn invariant_violation(&self, detail: &'static str) -> ! {
        log_error!(pool_id = self.pool_id, detail, "pool invariant violated");
        panic!("chunkpool: internal invariant violated: {detail}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(chunk_size: usize, chunk_count: usize) -> Engine {
        Engine::new(1, chunk_size, chunk_count, PoolConfig::production()).unwrap()
    }

    #[test]
    fn zero_chunk_size_is_invalid_request() {
        let err = Engine::new(1, 0, 10, PoolConfig::production()).unwrap_err();
        assert!(matches!(err, PoolError::InvalidRequest { .. }));
    }

    #[test]
    fn zero_chunk_count_is_invalid_request() {
        let err = Engine::new(1, 4, 0, PoolConfig::production()).unwrap_err();
        assert!(matches!(err, PoolError::InvalidRequest { .. }));
    }

    #[test]
    fn zero_byte_alloc_is_invalid_request() {
        let mut e = engine(3, 10);
        let err = e.alloc(0).unwrap_err();
        assert!(matches!(err, PoolError::InvalidRequest { .. }));
    }

    #[test]
    fn scenario_split_and_reuse() {
        let mut e = engine(3, 10);
        let a = e.alloc(5).unwrap(); // chunks 0-1
        assert_eq!(a.chunk_index(), 0);
        let b = e.alloc(3).unwrap(); // chunk 2
        assert_eq!(b.chunk_index(), 2);
        e.free(a).unwrap();
        let c = e.alloc(3).unwrap(); // chunk 0
        assert_eq!(c.chunk_index(), 0);
        let d = e.alloc(3).unwrap(); // chunk 1
        assert_eq!(d.chunk_index(), 1);
        assert_eq!(e.free_chunks(), 7);
        assert_eq!(e.free_list.live_len(), 1);
        assert_eq!(e.free_list.live()[0], 3);
        assert_eq!(e.table.get(3).free_run, 7);
    }

    #[test]
    fn scenario_coalesce_left_and_right() {
        let mut e = engine(3, 10);
        let a = e.alloc(3).unwrap();
        let b = e.alloc(3).unwrap();
        let c = e.alloc(3).unwrap();
        e.free(a).unwrap();
        e.free(c).unwrap();
        e.free(b).unwrap();
        assert_eq!(e.free_list.live_len(), 1);
        assert_eq!(e.free_list.live()[0], 0);
        assert_eq!(e.table.get(0).free_run, 10);
        assert_eq!(e.free_chunks(), 10);
    }

    #[test]
    fn scenario_overflow() {
        let mut e = engine(3, 10);
        for _ in 0..10 {
            e.alloc(3).unwrap();
        }
        let err = e.alloc(3).unwrap_err();
        assert!(matches!(err, PoolError::OutOfSpace { .. }));
    }

    #[test]
    fn scenario_fragmentation_blocks_large_request() {
        let mut e = engine(3, 10);
        let a = e.alloc(3).unwrap();
        let _b = e.alloc(3).unwrap();
        let c = e.alloc(3).unwrap();
        let _d = e.alloc(3).unwrap();
        e.free(a).unwrap();
        e.free(c).unwrap();
        let err = e.alloc(6).unwrap_err();
        assert!(matches!(err, PoolError::OutOfSpace { .. }));
        let handle = e.alloc(3).unwrap();
        assert!(handle.chunk_index() == 0 || handle.chunk_index() == 2);
    }

    #[test]
    fn scenario_last_inserted_first_policy() {
        let mut e = engine(3, 10);
        let a = e.alloc(3).unwrap(); // chunk 0
        let _b = e.alloc(3).unwrap(); // chunk 1
        let c = e.alloc(3).unwrap(); // chunk 2
        e.free(a).unwrap();
        e.free(c).unwrap();
        let next = e.alloc(3).unwrap();
        assert_eq!(next.chunk_index(), 2);
    }

    #[test]
    fn scenario_clear() {
        let mut e = engine(3, 10);
        let _a = e.alloc(3).unwrap();
        let _b = e.alloc(6).unwrap();
        e.clear();
        let handle = e.alloc(30).unwrap();
        assert_eq!(handle.chunk_index(), 0);
    }

    #[test]
    fn boundary_alloc_whole_pool_only_when_empty() {
        let mut e = engine(3, 10);
        let h = e.alloc(30).unwrap();
        assert_eq!(h.chunk_index(), 0);
        let mut e2 = engine(3, 10);
        let _ = e2.alloc(3).unwrap();
        assert!(matches!(e2.alloc(30).unwrap_err(), PoolError::OutOfSpace { .. }));
    }

    #[test]
    fn boundary_one_byte_uses_one_chunk() {
        let mut e = engine(3, 10);
        let h = e.alloc(1).unwrap();
        assert_eq!(e.table.get(h.chunk_index()).used_chunks, 1);
    }

    #[test]
    fn boundary_chunk_size_plus_one_uses_two_chunks() {
        let mut e = engine(3, 10);
        let h = e.alloc(4).unwrap();
        assert_eq!(e.table.get(h.chunk_index()).used_chunks, 2);
    }

    #[test]
    fn boundary_double_free_is_invalid_free() {
        let mut e = engine(3, 10);
        let h = e.alloc(3).unwrap();
        e.free(h).unwrap();
        assert!(matches!(e.free(h).unwrap_err(), PoolError::InvalidFree { .. }));
    }

    #[test]
    fn round_trip_alloc_then_free_restores_free_chunks() {
        let mut e = engine(3, 10);
        let before = e.free_chunks();
        let h = e.alloc(5).unwrap();
        e.free(h).unwrap();
        assert_eq!(e.free_chunks(), before);
    }

    #[test]
    fn foreign_pool_handle_is_invalid_free() {
        let mut e = engine(3, 10);
        let foreign = Handle::new(e.pool_id() + 1, 0, 1);
        assert!(matches!(e.free(foreign).unwrap_err(), PoolError::InvalidFree { .. }));
    }
}
