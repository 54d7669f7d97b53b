//! The type-erased buffer descriptor and its primitive operations.
//!
//! [`RawBuffer`] is the `(items, count, capacity)` triple plus the element
//! layout it was created for. It knows nothing about the element type: every
//! operation works on byte offsets computed from the layout's stride, so a
//! single non-generic implementation serves every instantiation of the typed
//! [`Yar`](crate::Yar) container.
//!
//! Pointers returned by the mutating operations stay valid only until the
//! next call that may reallocate. The typed layer turns that rule into a
//! borrow; callers using `RawBuffer` directly must uphold it by hand.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ops::Range;
use std::ptr::{self, NonNull};

use tracing::{debug, trace};

use crate::alloc::Allocator;
use crate::config::GrowthPolicy;
use crate::error::BufferError;

/// A growable, contiguous region of fixed-size elements of unknown type.
///
/// Invariants, after every operation returns:
///
/// - `count <= capacity`.
/// - `items` is `None` whenever `capacity * stride == 0`; otherwise it is a
///   region obtained from the caller's allocator with layout
///   `capacity * stride` bytes at the element alignment.
/// - Slots handed out by [`reserve`](Self::reserve),
///   [`append`](Self::append) and [`insert`](Self::insert) are zeroed.
///
/// A `RawBuffer` does not own its allocator and has no `Drop`. Every method
/// that takes an allocator is `unsafe`, because the descriptor cannot check
/// that the region it holds came from the allocator it is handed. The typed
/// [`Yar`](crate::Yar) owns its allocator and discharges that obligation.
///
/// ```compile_fail
/// use std::alloc::Layout;
/// use yar_buffer::{Heap, RawBuffer};
///
/// let mut buf = RawBuffer::new(Layout::new::<u32>());
/// buf.append(&Heap).unwrap();
/// ```
#[derive(Debug)]
pub struct RawBuffer {
    items: Option<NonNull<u8>>,
    count: usize,
    capacity: usize,
    elem: Layout,
    policy: GrowthPolicy,
}

impl RawBuffer {
    /// Create an empty descriptor for elements of layout `elem`, using the
    /// default growth policy. Allocates nothing.
    pub fn new(elem: Layout) -> Self {
        Self {
            items: None,
            count: 0,
            capacity: 0,
            elem,
            policy: GrowthPolicy::DEFAULT,
        }
    }

    /// Create an empty descriptor with a custom growth policy.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidPolicy`] if `policy` fails validation.
    pub fn with_policy(elem: Layout, policy: GrowthPolicy) -> Result<Self, BufferError> {
        policy.validate()?;
        Ok(Self {
            policy,
            ..Self::new(elem)
        })
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether there are no live elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of elements the region holds without reallocating.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Layout of a single element.
    pub fn elem_layout(&self) -> Layout {
        self.elem
    }

    /// The growth policy fixed at construction.
    pub fn policy(&self) -> &GrowthPolicy {
        &self.policy
    }

    /// Pointer to element 0.
    ///
    /// Dangling (but aligned) when nothing is allocated.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.base()
    }

    /// Ensure `count + extra` elements fit, and zero the `extra` slots
    /// starting at `count`. Does not change `count`.
    ///
    /// Returns a pointer to slot `count`. With `extra == 0` this is a
    /// one-past-the-end sentinel.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityOverflow`] if the request cannot be sized,
    /// [`BufferError::AllocationFailed`] if the allocator refuses it. The
    /// descriptor is unchanged in both cases.
    ///
    /// # Safety
    ///
    /// Every call on this buffer that takes an allocator, from the first
    /// growth up to [`release`](Self::release), must pass `alloc` or an
    /// allocator that manages the same regions.
    pub unsafe fn reserve<A: Allocator + ?Sized>(
        &mut self,
        extra: usize,
        alloc: &A,
    ) -> Result<NonNull<u8>, BufferError> {
        let required = self
            .count
            .checked_add(extra)
            .ok_or(BufferError::CapacityOverflow {
                count: self.count,
                extra,
            })?;
        if required > self.capacity {
            self.grow(required, extra, alloc)?;
        }
        let slot = self.slot(self.count);
        // SAFETY: slots [count, count + extra) lie inside the region, whose
        // byte size was checked when it was sized.
        unsafe { slot.as_ptr().write_bytes(0, extra * self.stride()) };
        Ok(slot)
    }

    /// Reserve one slot and commit it. The new element is zeroed.
    ///
    /// # Errors
    ///
    /// Propagates [`reserve`](Self::reserve) failures; `count` is unchanged.
    ///
    /// # Safety
    ///
    /// Same allocator requirement as [`reserve`](Self::reserve).
    pub unsafe fn append<A: Allocator + ?Sized>(
        &mut self,
        alloc: &A,
    ) -> Result<NonNull<u8>, BufferError> {
        // SAFETY: forwarded from the caller.
        let slot = unsafe { self.reserve(1, alloc)? };
        self.count += 1;
        Ok(slot)
    }

    /// Append a copy of `num` elements read from `src`.
    ///
    /// Returns a pointer to the first appended element.
    ///
    /// # Errors
    ///
    /// Propagates [`reserve`](Self::reserve) failures; nothing is copied.
    ///
    /// # Safety
    ///
    /// `src` must be valid for reads of `num` elements of this buffer's
    /// layout and must not point into this buffer's own storage (growth may
    /// move it). Use [`append_within`](Self::append_within) for self-copies.
    /// The allocator requirement of [`reserve`](Self::reserve) applies too.
    pub unsafe fn append_many<A: Allocator + ?Sized>(
        &mut self,
        src: *const u8,
        num: usize,
        alloc: &A,
    ) -> Result<NonNull<u8>, BufferError> {
        // SAFETY: the allocator requirement is forwarded from the caller.
        let dst = unsafe { self.reserve(num, alloc)? };
        // SAFETY: `dst` has room for `num` elements; the caller guarantees
        // `src` is readable for the same length and disjoint from us.
        unsafe { ptr::copy_nonoverlapping(src, dst.as_ptr(), num * self.stride()) };
        self.count += num;
        Ok(dst)
    }

    /// Append a copy of this buffer's own elements in `src`.
    ///
    /// The source is resolved by index after growth, so relocation of the
    /// region cannot leave it dangling.
    ///
    /// # Errors
    ///
    /// [`BufferError::IndexOutOfRange`] if `src` is not inside `[0, count)`,
    /// otherwise propagates [`reserve`](Self::reserve) failures.
    ///
    /// # Safety
    ///
    /// Same allocator requirement as [`reserve`](Self::reserve).
    pub unsafe fn append_within<A: Allocator + ?Sized>(
        &mut self,
        src: Range<usize>,
        alloc: &A,
    ) -> Result<NonNull<u8>, BufferError> {
        if src.start > src.end || src.end > self.count {
            return Err(BufferError::IndexOutOfRange {
                index: src.start.max(src.end),
                count: self.count,
            });
        }
        let num = src.end - src.start;
        // SAFETY: forwarded from the caller.
        let dst = unsafe { self.reserve(num, alloc)? };
        let from = self.slot(src.start);
        // SAFETY: the source lies in [0, count) and the destination in
        // [count, count + num); both are inside the region and disjoint.
        unsafe { ptr::copy_nonoverlapping(from.as_ptr(), dst.as_ptr(), num * self.stride()) };
        self.count += num;
        Ok(dst)
    }

    /// Open a gap of `num` zeroed elements at `index`, shifting the suffix
    /// up. Returns a pointer to the first element of the gap.
    ///
    /// `num == 0` is inert at any index, including past the end; the
    /// returned pointer is then only a sentinel.
    ///
    /// # Errors
    ///
    /// [`BufferError::IndexOutOfRange`] if `num > 0` and `index > count`,
    /// otherwise propagates [`reserve`](Self::reserve) failures. The
    /// descriptor is unchanged on error.
    ///
    /// # Safety
    ///
    /// Same allocator requirement as [`reserve`](Self::reserve).
    pub unsafe fn insert<A: Allocator + ?Sized>(
        &mut self,
        index: usize,
        num: usize,
        alloc: &A,
    ) -> Result<NonNull<u8>, BufferError> {
        if num == 0 {
            return Ok(self.sentinel(index));
        }
        if index > self.count {
            return Err(BufferError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }
        let count = self.count;
        // SAFETY: forwarded from the caller.
        unsafe { self.reserve(num, alloc)? };
        let gap = self.slot(index);
        if index < count {
            let stride = self.stride();
            let shifted = self.slot(index + num);
            // SAFETY: [index, count) moves to [index + num, count + num),
            // which fits after the reservation. `ptr::copy` tolerates the
            // overlap. The gap is then inside the live range.
            unsafe {
                ptr::copy(gap.as_ptr(), shifted.as_ptr(), (count - index) * stride);
                gap.as_ptr().write_bytes(0, num * stride);
            }
        }
        self.count += num;
        Ok(gap)
    }

    /// Remove `num` elements starting at `index`, shifting the tail down.
    ///
    /// - `num >= count` clears the buffer regardless of `index` and returns
    ///   the base pointer. Capacity is kept.
    /// - `index >= count` is a no-op returning the base pointer.
    /// - A range running past the end is truncated at `count`.
    ///
    /// Otherwise returns a pointer to `index`, now holding the first element
    /// after the removed range.
    pub fn remove(&mut self, index: usize, num: usize) -> NonNull<u8> {
        if num >= self.count {
            self.count = 0;
            return self.base();
        }
        if index >= self.count {
            return self.base();
        }
        let num = num.min(self.count - index);
        let tail = self.count - index - num;
        if num > 0 && tail > 0 {
            let dst = self.slot(index);
            let src = self.slot(index + num);
            // SAFETY: both ranges lie in [index, count); `ptr::copy`
            // tolerates the overlap.
            unsafe { ptr::copy(src.as_ptr(), dst.as_ptr(), tail * self.stride()) };
        }
        self.count -= num;
        self.slot(index)
    }

    /// Forget all live elements, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Set the live count directly.
    ///
    /// # Safety
    ///
    /// `new_len <= capacity`, and every slot below `new_len` must hold
    /// initialised bytes valid for the element type the caller reads them
    /// as (for instance, slots zeroed by a prior [`reserve`](Self::reserve)).
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity);
        self.count = new_len;
    }

    /// Return the region to `alloc` and reset to the empty state.
    ///
    /// Idempotent.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator (or one managing the same regions) that
    /// every earlier growing call on this buffer was given.
    pub unsafe fn release<A: Allocator + ?Sized>(&mut self, alloc: &A) {
        if let Some((region, layout)) = self.items.take().zip(self.region_layout(self.capacity)) {
            trace!(
                capacity = self.capacity,
                bytes = layout.size(),
                "releasing buffer region"
            );
            // SAFETY: the caller guarantees `region` came from `alloc`; it was
            // sized with exactly this layout and leaves the descriptor first.
            unsafe { alloc.release(region, layout) };
        }
        self.count = 0;
        self.capacity = 0;
    }

    fn grow<A: Allocator + ?Sized>(
        &mut self,
        required: usize,
        extra: usize,
        alloc: &A,
    ) -> Result<(), BufferError> {
        let candidate = self.policy.next_capacity(self.capacity, required);
        let (new_capacity, new_layout) = match self.region_layout(candidate) {
            Some(layout) => (candidate, layout),
            // The geometric step cannot be sized; settle for the exact fit.
            None => match self.region_layout(required) {
                Some(layout) => (required, layout),
                None => {
                    return Err(BufferError::CapacityOverflow {
                        count: self.count,
                        extra,
                    })
                }
            },
        };

        if new_layout.size() == 0 {
            // Zero-sized elements never touch the allocator.
            self.capacity = new_capacity;
            return Ok(());
        }

        let current = self.items.zip(self.region_layout(self.capacity));
        // SAFETY: `new_layout` is non-zero, `current` was produced by this
        // allocator with its recorded layout (the public callers require the
        // same allocator throughout), and the alignment is the element
        // alignment in both.
        let Some(region) = (unsafe { alloc.grow_or_allocate(current, new_layout) }) else {
            debug!(
                capacity = self.capacity,
                requested_capacity = new_capacity,
                requested_bytes = new_layout.size(),
                "allocator refused buffer growth"
            );
            return Err(BufferError::AllocationFailed {
                requested: new_layout.size(),
            });
        };

        trace!(
            old_capacity = self.capacity,
            new_capacity,
            elem_size = self.elem.size(),
            moved = current.is_some_and(|(old, _)| old != region),
            "buffer grown"
        );
        self.items = Some(region);
        self.capacity = new_capacity;
        Ok(())
    }

    fn stride(&self) -> usize {
        self.elem.pad_to_align().size()
    }

    fn region_layout(&self, capacity: usize) -> Option<Layout> {
        let bytes = capacity.checked_mul(self.stride())?;
        Layout::from_size_align(bytes, self.elem.align()).ok()
    }

    fn base(&self) -> NonNull<u8> {
        self.items.unwrap_or_else(|| dangling(self.elem.align()))
    }

    /// Pointer to slot `index`, which must be `<= capacity`.
    fn slot(&self, index: usize) -> NonNull<u8> {
        debug_assert!(index <= self.capacity);
        // SAFETY: `index <= capacity`, so the offset stays within (or one
        // past) the region. Without a region the offset is zero bytes.
        unsafe { self.base().add(index * self.stride()) }
    }

    /// Pointer arithmetic for indices that may lie past the region. The
    /// result is never dereferenced.
    fn sentinel(&self, index: usize) -> NonNull<u8> {
        let base = self.base();
        NonNull::new(
            base.as_ptr()
                .wrapping_add(index.wrapping_mul(self.stride())),
        )
        .unwrap_or(base)
    }
}

fn dangling(align: usize) -> NonNull<u8> {
    NonNull::new(ptr::without_provenance_mut(align)).unwrap_or(NonNull::dangling())
}
