//! The allocator seam.
//!
//! The engine never calls the global allocator directly. Every region it
//! owns is obtained from and returned to an [`Allocator`], which has exactly
//! two entry points: grow-or-allocate and release. [`Heap`] forwards to
//! `std::alloc`; tests substitute adapters that count or refuse requests.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

/// A pluggable source of buffer memory.
///
/// Failure is reported by returning `None`, never by panicking or aborting.
///
/// # Safety
///
/// Implementations must uphold the following for the engine to be sound:
///
/// - A `Some(ptr)` returned from [`grow_or_allocate`](Self::grow_or_allocate)
///   points to a region valid for reads and writes of `new.size()` bytes,
///   aligned to `new.align()`, and not aliased by any other live region.
/// - When growing an existing region, the first `min(old.size(), new.size())`
///   bytes are preserved and the old pointer is no longer used.
/// - When `None` is returned, the existing region (if any) is left valid
///   and unchanged.
pub unsafe trait Allocator {
    /// Allocate a fresh region (`current == None`) or resize an existing one.
    ///
    /// # Safety
    ///
    /// `new.size()` must be non-zero. If `current` is `Some((ptr, old))`,
    /// `ptr` must have been returned by this allocator with layout `old`,
    /// and `old.align() == new.align()`.
    unsafe fn grow_or_allocate(
        &self,
        current: Option<(NonNull<u8>, Layout)>,
        new: Layout,
    ) -> Option<NonNull<u8>>;

    /// Return a region to the allocator.
    ///
    /// # Safety
    ///
    /// `region` must have been returned by this allocator with `layout` and
    /// must not be used afterwards.
    unsafe fn release(&self, region: NonNull<u8>, layout: Layout);
}

// SAFETY: forwards to `A`, which upholds the contract.
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    unsafe fn grow_or_allocate(
        &self,
        current: Option<(NonNull<u8>, Layout)>,
        new: Layout,
    ) -> Option<NonNull<u8>> {
        // SAFETY: the caller's guarantees are passed through unchanged.
        unsafe { (**self).grow_or_allocate(current, new) }
    }

    unsafe fn release(&self, region: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller's guarantees are passed through unchanged.
        unsafe { (**self).release(region, layout) }
    }
}

/// The default adapter: the process-wide global allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Heap;

// SAFETY: `std::alloc::{alloc, realloc}` return null on failure and leave the
// original block untouched; `realloc` preserves the common prefix.
unsafe impl Allocator for Heap {
    unsafe fn grow_or_allocate(
        &self,
        current: Option<(NonNull<u8>, Layout)>,
        new: Layout,
    ) -> Option<NonNull<u8>> {
        let raw = match current {
            // SAFETY: `new.size()` is non-zero per the caller contract.
            None => unsafe { std::alloc::alloc(new) },
            // SAFETY: `ptr` came from this allocator with `old`, the
            // alignment is unchanged, and `new.size()` is a valid non-zero
            // size for that alignment (it came from a `Layout`).
            Some((ptr, old)) => unsafe { std::alloc::realloc(ptr.as_ptr(), old, new.size()) },
        };
        NonNull::new(raw)
    }

    unsafe fn release(&self, region: NonNull<u8>, layout: Layout) {
        // SAFETY: `region` came from this allocator with `layout`.
        unsafe { std::alloc::dealloc(region.as_ptr(), layout) }
    }
}
