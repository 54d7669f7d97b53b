//! Test utilities and fixtures for yar development.
//!
//! Provides allocator adapters that observe or sabotage the engine's
//! allocator seam (see [`fixtures`]) and element types shaped like the
//! ones the buffer is used with in practice.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{AllocStats, CountingAllocator, FailingAllocator};

use bytemuck::Zeroable;

/// A small single-field element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
#[repr(C)]
pub struct Thing {
    pub w: f32,
}

impl Thing {
    pub fn new(w: f32) -> Self {
        Self { w }
    }
}

/// Number of vertices held by a [`LargeStruct`].
pub const LARGE_STRUCT_VERTICES: usize = 12_000;

/// A ~96 KB element, too big to build comfortably on the stack.
///
/// Meant to be created in place with `append` or `reserve`.
#[derive(Clone, Copy, Zeroable)]
#[repr(C)]
pub struct LargeStruct {
    pub vertices: [f32; LARGE_STRUCT_VERTICES],
    pub colours: [u32; LARGE_STRUCT_VERTICES],
    pub count: i32,
}

impl LargeStruct {
    /// Fill the first `count` vertices with a recognisable ramp.
    pub fn fill_ramp(&mut self, count: usize) {
        let count = count.min(LARGE_STRUCT_VERTICES);
        for (i, v) in self.vertices[..count].iter_mut().enumerate() {
            *v = 10.0 * i as f32 / 100.0;
        }
        self.count = count as i32;
    }

    /// Whether every byte of the element is still zero.
    pub fn is_zeroed(&self) -> bool {
        self.count == 0
            && self.vertices.iter().all(|&v| v.to_bits() == 0)
            && self.colours.iter().all(|&c| c == 0)
    }
}
