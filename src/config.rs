//! Pool construction-time configuration.

use std::sync::Arc;

/// Configuration supplied to [`crate::ChunkPool::with_config`].
///
/// The three presets mirror each other's trade-off along a single axis:
/// debuggability vs. overhead. `track_stats` and the fill patterns cost a
/// few branches per `alloc`/`free`; leave them off (`production()` /
/// `performance()`) on the hot path.
#[derive(Clone)]
pub struct PoolConfig {
    /// Track cumulative alloc/free counts and peak usage.
    pub track_stats: bool,

    /// Byte pattern written into a chunk's bytes when it is split off a
    /// larger free run and handed to a fresh allocation. `None` leaves the
    /// bytes untouched (uninitialized, as a real allocator would).
    pub alloc_pattern: Option<u8>,

    /// Byte pattern written into a slot's bytes when it is freed, to catch
    /// use-after-free in debug builds. `None` leaves the bytes untouched.
    pub dealloc_pattern: Option<u8>,

    /// Upper bound on `chunk_size * chunk_count` accepted by
    /// [`crate::ChunkPool::new`]; constructing past it fails with
    /// [`crate::PoolError::InvalidRequest`] instead of attempting an
    /// allocation the platform cannot satisfy.
    pub max_pool_bytes: usize,

    /// Optional sink for already-formatted diagnostic text: the dump
    /// operations in [`crate::diagnostics`] write here in addition to (or
    /// instead of) any `impl Write` passed explicitly, when set.
    pub diagnostic_sink: Option<Arc<dyn Fn(&str) + Send + Sync>>,
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("track_stats", &self.track_stats)
            .field("alloc_pattern", &self.alloc_pattern)
            .field("dealloc_pattern", &self.dealloc_pattern)
            .field("max_pool_bytes", &self.max_pool_bytes)
            .field("diagnostic_sink", &self.diagnostic_sink.is_some())
            .finish()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) { Some(0xAA) } else { None },
            dealloc_pattern: if cfg!(debug_assertions) { Some(0xDD) } else { None },
            max_pool_bytes: isize::MAX as usize,
            diagnostic_sink: None,
        }
    }
}

impl PoolConfig {
    /// Optimized for production: no stats, no fill patterns.
    #[must_use]
    pub fn production() -> Self {
        Self {
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            ..Self::default()
        }
    }

    /// Optimized for catching bugs: stats on, fill patterns on.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            alloc_pattern: Some(0xAA),
            dealloc_pattern: Some(0xDD),
            ..Self::default()
        }
    }

    /// Minimal overhead: identical to `production()` today, kept distinct
    /// so future overhead-sensitive knobs (e.g. disabling bounds checks on
    /// typed handles) have a dedicated preset to land in.
    #[must_use]
    pub fn performance() -> Self {
        Self::production()
    }

    /// Attach a diagnostic sink, overriding any previously set one.
    #[must_use]
    pub fn with_diagnostic_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.diagnostic_sink = Some(Arc::new(sink));
        self
    }
}
