//! Allocator fixtures for exercising the engine's allocator seam.
//!
//! - [`CountingAllocator`] — forwards to the heap and records every call.
//! - [`FailingAllocator`] — forwards to the heap until told to refuse.
//!
//! Both use atomics for their counters so shared references can be handed
//! to a buffer while the test keeps inspecting or toggling them.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use yar_buffer::{Allocator, Heap};

/// Snapshot of a [`CountingAllocator`]'s counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Fresh allocations (`current == None`).
    pub allocations: usize,
    /// Resizes of an existing region.
    pub reallocations: usize,
    /// Regions returned.
    pub releases: usize,
    /// Bytes currently held.
    pub live_bytes: usize,
}

impl AllocStats {
    /// Total grow-or-allocate calls.
    pub fn grow_calls(&self) -> usize {
        self.allocations + self.reallocations
    }
}

/// Heap-backed allocator that counts every call through the seam.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocations: AtomicUsize,
    reallocations: AtomicUsize,
    releases: AtomicUsize,
    live_bytes: AtomicUsize,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counter values.
    pub fn stats(&self) -> AllocStats {
        AllocStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            reallocations: self.reallocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
        }
    }
}

// SAFETY: every call is forwarded to `Heap` unchanged.
unsafe impl Allocator for CountingAllocator {
    unsafe fn grow_or_allocate(
        &self,
        current: Option<(NonNull<u8>, Layout)>,
        new: Layout,
    ) -> Option<NonNull<u8>> {
        // SAFETY: forwarded caller contract.
        let region = unsafe { Heap.grow_or_allocate(current, new) }?;
        match current {
            None => self.allocations.fetch_add(1, Ordering::Relaxed),
            Some((_, old)) => {
                self.live_bytes.fetch_sub(old.size(), Ordering::Relaxed);
                self.reallocations.fetch_add(1, Ordering::Relaxed)
            }
        };
        self.live_bytes.fetch_add(new.size(), Ordering::Relaxed);
        Some(region)
    }

    unsafe fn release(&self, region: NonNull<u8>, layout: Layout) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(layout.size(), Ordering::Relaxed);
        // SAFETY: forwarded caller contract.
        unsafe { Heap.release(region, layout) }
    }
}

/// Heap-backed allocator that refuses growth deterministically.
///
/// Succeeds `succeed_count` grow-or-allocate calls, then refuses every
/// later one. [`set_refusing`](Self::set_refusing) forces refusal on or off
/// regardless of the count. Releases always go through.
#[derive(Debug)]
pub struct FailingAllocator {
    pub succeed_count: usize,
    call_count: AtomicUsize,
    refusing: AtomicBool,
}

impl FailingAllocator {
    /// Create an allocator that succeeds `succeed_count` times then fails.
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: AtomicUsize::new(0),
            refusing: AtomicBool::new(false),
        }
    }

    /// An allocator that never fails on its own.
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Force refusal on or off.
    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::Relaxed);
    }

    /// How many times grow-or-allocate has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Reset the call counter.
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::Relaxed);
    }
}

// SAFETY: refusals return `None` without touching `current`; everything else
// is forwarded to `Heap` unchanged.
unsafe impl Allocator for FailingAllocator {
    unsafe fn grow_or_allocate(
        &self,
        current: Option<(NonNull<u8>, Layout)>,
        new: Layout,
    ) -> Option<NonNull<u8>> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.refusing.load(Ordering::Relaxed) || n >= self.succeed_count {
            return None;
        }
        // SAFETY: forwarded caller contract.
        unsafe { Heap.grow_or_allocate(current, new) }
    }

    unsafe fn release(&self, region: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded caller contract.
        unsafe { Heap.release(region, layout) }
    }
}
