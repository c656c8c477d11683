//! Concurrency wrapper (C6): the public, thread-safe pool type.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::ReentrantMutex;

use crate::config::PoolConfig;
use crate::engine::{Engine, Stats};
use crate::error::{PoolError, PoolResult};
use crate::handle::{Handle, PoolId};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// A fixed-capacity, variable-size chunk pool allocator.
///
/// Construct with [`ChunkPool::new`], allocate with [`ChunkPool::alloc`],
/// release with [`ChunkPool::free`]. Safe to share across threads: every
/// mutating call and every query acquires a single recursive-safe mutex
/// around the engine. [`ChunkPool::data`] and handle validity resolution
/// are the exception — they read pool-identity and chunk-geometry fields
/// that are fixed at construction and never touch the locked engine state,
/// so they don't lock (see the type's field docs).
pub struct ChunkPool {
    engine: ReentrantMutex<RefCell<Engine>>,
    pool_id: PoolId,
    chunk_size: usize,
    chunk_count: u32,
    /// Base pointer into the engine's raw buffer. Valid for the pool's
    /// whole lifetime: the buffer is a single fixed-size `Box<[u8]>`
    /// allocated once in [`Engine::new`] and never reallocated, so the
    /// pointer survives even though `ChunkPool` itself may be moved.
    buffer_ptr: *const u8,
}

// SAFETY: `buffer_ptr` points at `Engine`'s `RawBuffer`, which is a fixed
// allocation for the pool's entire lifetime and is never mutated through
// `buffer_ptr` itself (only read, for pointer arithmetic) outside of the
// mutex-guarded engine. All other fields are already `Send + Sync`.
unsafe impl Send for ChunkPool {}
unsafe impl Sync for ChunkPool {}

impl ChunkPool {
    /// Reserve `chunk_count` chunks of `chunk_size` bytes each, using
    /// [`PoolConfig::default`].
    pub fn new(chunk_size: usize, chunk_count: usize) -> PoolResult<Self> {
        Self::with_config(chunk_size, chunk_count, PoolConfig::default())
    }

    pub fn with_config(chunk_size: usize, chunk_count: usize, config: PoolConfig) -> PoolResult<Self> {
        let pool_id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let engine = Engine::new(pool_id, chunk_size, chunk_count, config)?;
        let buffer_ptr = engine.buffer().as_slice().as_ptr();
        let chunk_count = engine.chunk_count();
        let chunk_size = engine.chunk_size();
        Ok(ChunkPool {
            engine: ReentrantMutex::new(RefCell::new(engine)),
            pool_id,
            chunk_size,
            chunk_count,
            buffer_ptr,
        })
    }

    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    pub fn alloc(&self, bytes: usize) -> PoolResult<Handle> {
        let guard = self.engine.lock();
        guard.borrow_mut().alloc(bytes)
    }

    /// Test/debug convenience that unwraps a successful allocation instead
    /// of propagating the error, mirroring the original implementation's
    /// assert-heavy test style (see DESIGN.md). Not for production call
    /// sites: it panics on `OutOfSpace`/`InvalidRequest`.
    pub fn alloc_or_panic(&self, bytes: usize) -> Handle {
        self.alloc(bytes)
            .unwrap_or_else(|e| panic!("chunkpool: alloc_or_panic failed: {e}"))
    }

    pub fn free(&self, handle: Handle) -> PoolResult<()> {
        let guard = self.engine.lock();
        guard.borrow_mut().free(handle)
    }

    pub fn clear(&self) {
        let guard = self.engine.lock();
        guard.borrow_mut().clear();
    }

    #[must_use]
    pub fn pool_size(&self) -> usize {
        let guard = self.engine.lock();
        guard.borrow().pool_size()
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    #[must_use]
    pub fn free_chunks(&self) -> u32 {
        let guard = self.engine.lock();
        guard.borrow().free_chunks()
    }

    #[must_use]
    pub fn used_chunks(&self) -> u32 {
        let guard = self.engine.lock();
        guard.borrow().used_chunks()
    }

    #[must_use]
    pub fn largest_free_run(&self) -> u32 {
        let guard = self.engine.lock();
        guard.borrow().largest_free_run()
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        let guard = self.engine.lock();
        guard.borrow().stats()
    }

    /// `is_valid` is a query: it reads current engine state (whether the
    /// handle's chunk is still a used-slot head) and so acquires the lock,
    /// unlike [`Self::data`].
    #[must_use]
    pub fn is_valid(&self, handle: &Handle) -> bool {
        if handle.pool_id() != self.pool_id {
            return false;
        }
        let guard = self.engine.lock();
        let engine = guard.borrow();
        let index = handle.chunk_index();
        index < engine.chunk_count() && engine.table().get(index).is_used_head()
    }

    /// Resolve a handle to a byte pointer without locking. Per §4.5, this
    /// does not validate liveness against current engine state — a stale
    /// handle (already freed, or from a pool that has been `clear()`ed)
    /// still resolves to a pointer; dereferencing it is then the caller's
    /// responsibility, exactly like a raw pointer from a general allocator.
    /// Returns `None` only for structurally invalid handles: wrong pool or
    /// an out-of-range chunk index.
    #[must_use]
    pub fn data(&self, handle: &Handle) -> Option<*const u8> {
        if handle.pool_id() != self.pool_id {
            return None;
        }
        if handle.chunk_index() >= self.chunk_count {
            return None;
        }
        // SAFETY: `chunk_index < chunk_count`, and `buffer_ptr` spans
        // `chunk_count * chunk_size` bytes for the pool's lifetime.
        Some(unsafe {
            self.buffer_ptr
                .add(handle.chunk_index() as usize * self.chunk_size)
        })
    }

    pub(crate) fn lock_engine(&self) -> parking_lot::ReentrantMutexGuard<'_, RefCell<Engine>> {
        self.engine.lock()
    }
}

impl Drop for ChunkPool {
    /// §3 "Lifecycle": destruction asserts `F` has exactly one live entry
    /// covering the whole pool — i.e. no outstanding allocations. A handle
    /// outliving its pool is a programmer error this catches rather than
    /// silently leaking undefined behaviour onto the caller.
    fn drop(&mut self) {
        let guard = self.engine.lock();
        let engine = guard.borrow();
        assert!(
            engine.free_chunks() == engine.chunk_count(),
            "chunkpool: pool dropped with {} chunk(s) still allocated",
            engine.used_chunks()
        );
    }
}
