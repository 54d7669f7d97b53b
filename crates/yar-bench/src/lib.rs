//! Workload builders for benchmarking the yar buffer engine.
//!
//! - [`sequential`]: an array filled one append at a time
//! - [`strided_indices`]: deterministic, well-spread insert/remove positions

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use yar_buffer::{BufferError, Yar};

/// Build an array holding `0..n`, appended one element at a time.
///
/// # Errors
///
/// Propagates allocation failure from the engine.
pub fn sequential(n: u32) -> Result<Yar<u32>, BufferError> {
    let mut yar = Yar::new();
    for i in 0..n {
        yar.push(i)?;
    }
    Ok(yar)
}

/// `count` positions spread over `[0, len]` by a fixed odd stride.
///
/// Deterministic so runs are comparable. The `i`th position is at most
/// `len + i`, the length an array starting at `len` has when an insert loop
/// reaches it.
pub fn strided_indices(len: usize, count: usize) -> Vec<usize> {
    const STRIDE: usize = 7919;
    (0..count)
        .map(|i| (i * STRIDE) % (len + i + 1))
        .collect()
}
