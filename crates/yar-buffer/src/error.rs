//! Buffer-specific error types.

use thiserror::Error;

/// Errors that can occur during buffer operations.
///
/// Every fallible operation leaves the buffer exactly as it was before the
/// call when it returns one of these.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The allocator could not satisfy a growth request.
    #[error("allocation failed: requested {requested} bytes")]
    AllocationFailed {
        /// Size of the region that was requested, in bytes.
        requested: usize,
    },
    /// `count + extra` elements cannot be represented as a byte size.
    #[error("capacity overflow: {count} live + {extra} extra elements exceed the address space")]
    CapacityOverflow {
        /// Live element count at the time of the request.
        count: usize,
        /// Number of additional elements requested.
        extra: usize,
    },
    /// A non-empty insertion was requested past the end of the live range.
    #[error("index {index} is past the live count {count}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Live element count at the time of the request.
        count: usize,
    },
    /// A commit tried to expose slots that were never reserved (and so
    /// never zeroed).
    #[error("cannot commit {requested} elements: only {reserved} reserved slots are zeroed")]
    CommitOverrun {
        /// Number of elements the caller tried to commit.
        requested: usize,
        /// Number of zeroed slots available past the live count.
        reserved: usize,
    },
    /// A [`GrowthPolicy`](crate::GrowthPolicy) failed validation.
    #[error("invalid growth policy: {reason}")]
    InvalidPolicy {
        /// Human-readable description of the problem.
        reason: String,
    },
}
