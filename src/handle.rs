//! Handle type (C5): an opaque, unowning reference to an allocated slot.

/// Identifies the pool a [`Handle`] belongs to, so a handle from one pool
/// is never accidentally resolved against another.
pub type PoolId = u64;

/// Reference to an allocated slot: which pool, which chunk is the head,
/// and (debug builds only) the slot's length for bounds-checked typed
/// access layered on top (see [`crate::typed`]).
///
/// A handle is an unowning view — duplicating it duplicates a weak
/// reference, not the underlying allocation. Freeing through one copy
/// invalidates every copy; the pool does not track that for you.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pool_id: PoolId,
    chunk_index: u32,
    #[cfg(debug_assertions)]
    len_chunks: u32,
}

impl Handle {
    #[allow(unused_variables)]
    pub(crate) fn new(pool_id: PoolId, chunk_index: u32, len_chunks: u32) -> Self {
        Handle {
            pool_id,
            chunk_index,
            #[cfg(debug_assertions)]
            len_chunks,
        }
    }

    #[inline]
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    #[inline]
    #[must_use]
    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    /// Length of the allocation in chunks. Only tracked in debug builds,
    /// where it backs bounds checks on typed wrappers; `None` in release.
    #[inline]
    #[must_use]
    pub fn len_chunks(&self) -> Option<u32> {
        #[cfg(debug_assertions)]
        {
            Some(self.len_chunks)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_pool_id_and_chunk_index() {
        let h = Handle::new(42, 5, 2);
        assert_eq!(h.pool_id(), 42);
        assert_eq!(h.chunk_index(), 5);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn len_chunks_tracked_in_debug() {
        let h = Handle::new(1, 0, 3);
        assert_eq!(h.len_chunks(), Some(3));
    }
}
