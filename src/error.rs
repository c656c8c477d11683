//! Error types for the chunk pool allocator.
//!
//! Follows the error taxonomy of the chunk-management engine: two
//! recoverable, caller-facing variants (`InvalidRequest`, `OutOfSpace`) and
//! two programmer-error variants (`InvalidFree`, `InvariantViolation`) that
//! indicate a bug in the caller or the engine itself rather than an
//! ordinary runtime condition.

use thiserror::Error;

/// Errors produced by [`crate::ChunkPool`] operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Zero-sized construction (`chunk_size` or `chunk_count` is zero) or a
    /// zero-byte `alloc` request.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Human-readable reason, always a `'static` string describing the
        /// violated precondition.
        reason: &'static str,
    },

    /// No free slot had enough contiguous chunks to satisfy the request.
    #[error(
        "out of space: requested {requested_chunks} chunks, largest free run is {largest_free_run}"
    )]
    OutOfSpace {
        /// Number of chunks the request needed.
        requested_chunks: u32,
        /// Size in chunks of the largest free run found during the search,
        /// useful for distinguishing "pool is full" from "pool is
        /// fragmented".
        largest_free_run: u32,
    },

    /// `free` was called with a null/foreign handle, a handle whose chunk
    /// is not the head of a used slot, or a handle that was already freed.
    #[error("invalid free: {reason}")]
    InvalidFree {
        /// Human-readable reason.
        reason: &'static str,
    },

    /// An internal invariant was violated. This indicates a bug in the
    /// engine, not a caller error, and is fatal: construction helpers that
    /// observe this variant panic rather than propagate it.
    #[error("internal invariant violated: {detail}")]
    InvariantViolation {
        /// Description of the invariant that failed to hold.
        detail: &'static str,
    },
}

impl PoolError {
    /// `true` for the two variants the engine always surfaces as a normal
    /// `Err`, even in release builds (as opposed to [`Self::InvariantViolation`],
    /// which always halts).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, PoolError::InvariantViolation { .. })
    }
}

/// Result type used by all [`crate::ChunkPool`] operations.
pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_violation_is_not_recoverable() {
        let err = PoolError::InvariantViolation { detail: "test" };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn out_of_space_is_recoverable() {
        let err = PoolError::OutOfSpace {
            requested_chunks: 3,
            largest_free_run: 1,
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn display_includes_fields() {
        let err = PoolError::OutOfSpace {
            requested_chunks: 4,
            largest_free_run: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains('4'));
        assert!(msg.contains('2'));
    }
}
