//! Type-erased growable buffer engine.
//!
//! A single, non-generic engine manages a contiguous, reallocatable region
//! of fixed-size elements for every element type. The typed [`Yar`] array is
//! a thin layer that fixes the element layout and exposes the slots as
//! slices.
//!
//! # Architecture
//!
//! ```text
//! Yar<T, A> (typed container, owns its allocator)
//! └── RawBuffer (items, count, capacity + element layout + GrowthPolicy)
//!     └── Allocator seam: grow_or_allocate / release
//!         └── Heap (std::alloc) or any test adapter
//! ```
//!
//! # Contracts
//!
//! - **Zeroed slots:** anything handed out by reserve, append or insert is
//!   all-zero until the caller writes it. Over-allocation that merely comes
//!   with growth is not zeroed until it is reserved.
//! - **No aborts:** allocation failure is a returned [`BufferError`], and the
//!   buffer is left exactly as it was before the call.
//! - **Monotonic capacity:** only an explicit release gives memory back.
//! - **Single owner:** nothing is synchronised; a buffer is mutated from one
//!   place at a time.
//!
//! # Safety
//!
//! `unsafe` is confined to `alloc.rs`, `raw.rs` and `array.rs`, each block
//! carrying a `// SAFETY:` justification. [`RawBuffer`] methods that take an
//! allocator are `unsafe fn`, since the descriptor cannot tell which
//! allocator its region came from; [`Yar`] owns its allocator and is safe.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod alloc;
pub mod array;
pub mod config;
pub mod error;
pub mod raw;

// Public re-exports for the primary API surface.
pub use crate::alloc::{Allocator, Heap};
pub use array::Yar;
pub use config::GrowthPolicy;
pub use error::BufferError;
pub use raw::RawBuffer;
