//! Yar: dynamic arrays that never abort on allocation failure.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! yar sub-crates. For most users, adding `yar` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use yar::prelude::*;
//!
//! let mut numbers: Yar<f64> = Yar::new();
//! *numbers.append()? = 0.5;
//! numbers.push(2.5)?;
//!
//! // Reserve space that might be used, and commit only what was filled.
//! let slots = numbers.reserve(4)?;
//! slots[0] = 4.25;
//! numbers.commit(1)?;
//!
//! numbers.insert(0, 1)?[0] = 1.0;
//! numbers.remove(1, 1);
//! assert_eq!(numbers.as_slice(), &[1.0, 2.5, 4.25]);
//! # Ok::<(), BufferError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`buffer`] | `yar-buffer` | Typed array, type-erased engine, allocator seam, growth policy |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// The buffer engine (`yar-buffer`).
///
/// Most users only need [`buffer::Yar`]. [`buffer::RawBuffer`] is the
/// type-erased descriptor underneath it, and [`buffer::Allocator`] is the
/// seam for plugging in a custom memory source.
pub use yar_buffer as buffer;

/// Common imports for typical yar usage.
///
/// ```rust
/// use yar::prelude::*;
/// ```
pub mod prelude {
    pub use yar_buffer::{Allocator, BufferError, GrowthPolicy, Heap, Yar};
}
