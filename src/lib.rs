//! A fixed-capacity, variable-size chunk pool allocator.
//!
//! [`ChunkPool::new`] reserves one contiguous buffer and partitions it
//! into equal-size chunks. [`ChunkPool::alloc`] returns a [`Handle`]
//! backed by a contiguous run of chunks; [`ChunkPool::free`] returns the
//! run to the pool and coalesces it with free neighbours. The pool never
//! grows past its initial capacity and guarantees no alignment beyond one
//! byte — see [`typed`] for a thin wrapper that adds construction,
//! destruction, and bounds-checked typed access on top.
//!
//! ```
//! use chunkpool::ChunkPool;
//!
//! let pool = ChunkPool::new(64, 16).unwrap();
//! let handle = pool.alloc(100).unwrap();
//! pool.free(handle).unwrap();
//! ```

mod buffer;
mod chunk;
mod config;
pub mod error;
mod engine;
mod freelist;
mod handle;
mod pool;
pub mod typed;
pub mod utils;

#[cfg(feature = "diagnostics")]
pub mod diagnostics;

pub use config::PoolConfig;
pub use engine::Stats;
pub use error::{PoolError, PoolResult};
pub use handle::{Handle, PoolId};
pub use pool::ChunkPool;
