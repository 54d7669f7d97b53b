//! Typed dynamic array over the type-erased engine.
//!
//! [`Yar`] owns a [`RawBuffer`] and the allocator that feeds it. The element
//! type only fixes the layout and lets the slots be viewed as `&[T]`; every
//! growth, shift and zero-fill runs in the shared non-generic code in
//! [`raw`](crate::raw).
//!
//! Mutating calls borrow the array mutably and hand back references bound to
//! that borrow, so a slot cannot be used after a call that may move it.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Range};
use std::ptr::NonNull;

use bytemuck::Zeroable;

use crate::alloc::{Allocator, Heap};
use crate::config::GrowthPolicy;
use crate::error::BufferError;
use crate::raw::RawBuffer;

/// A growable array of `T` with fallible, zero-initialising growth.
///
/// `T` must be valid when all-zero ([`Zeroable`]) and trivially copyable:
/// new slots are produced by zero-filling bytes and elements are moved with
/// byte copies. No operation panics on allocation failure; it returns
/// [`BufferError`] and leaves the array unchanged.
///
/// ```
/// use yar_buffer::Yar;
///
/// let mut ints: Yar<i32> = Yar::new();
/// *ints.append().unwrap() = 10;
/// ints.push(20).unwrap();
/// assert_eq!(ints.as_slice(), &[10, 20]);
/// assert_eq!(ints.capacity(), 16);
/// ```
pub struct Yar<T, A: Allocator = Heap> {
    raw: RawBuffer,
    alloc: A,
    /// Zeroed slots past `len` from the most recent `reserve`.
    reserved: usize,
    _marker: PhantomData<T>,
}

impl<T: Zeroable + Copy> Yar<T, Heap> {
    /// Create an empty array on the global heap. Allocates nothing.
    pub fn new() -> Self {
        Self::new_in(Heap)
    }
}

impl<T: Zeroable + Copy> Default for Yar<T, Heap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Zeroable + Copy, A: Allocator> Yar<T, A> {
    /// Create an empty array backed by `alloc`. Allocates nothing.
    pub fn new_in(alloc: A) -> Self {
        Self {
            raw: RawBuffer::new(Layout::new::<T>()),
            alloc,
            reserved: 0,
            _marker: PhantomData,
        }
    }

    /// Create an empty array backed by `alloc` with a custom growth policy.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidPolicy`] if `policy` fails validation.
    pub fn with_policy_in(policy: GrowthPolicy, alloc: A) -> Result<Self, BufferError> {
        Ok(Self {
            raw: RawBuffer::with_policy(Layout::new::<T>(), policy)?,
            alloc,
            reserved: 0,
            _marker: PhantomData,
        })
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether there are no live elements.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of elements held without reallocating.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// The growth policy in effect.
    pub fn policy(&self) -> &GrowthPolicy {
        self.raw.policy()
    }

    /// The allocator backing this array.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// The live elements.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` holds initialised `T`s (zeroed or written), and
        // the base pointer is aligned for `T` even when nothing is allocated.
        unsafe { std::slice::from_raw_parts(self.raw.as_ptr().cast::<T>().as_ptr(), self.len()) }
    }

    /// The live elements, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`, with exclusive access through `&mut self`.
        unsafe {
            std::slice::from_raw_parts_mut(self.raw.as_ptr().cast::<T>().as_ptr(), self.len())
        }
    }

    /// Make room for `extra` more elements without committing them.
    ///
    /// Returns the `extra` zeroed slots after the live range. Fill some
    /// prefix of them and call [`commit`](Self::commit) to make it live.
    /// Reserving again before committing returns the same slots.
    ///
    /// # Errors
    ///
    /// [`BufferError::AllocationFailed`] or [`BufferError::CapacityOverflow`];
    /// the array is unchanged.
    pub fn reserve(&mut self, extra: usize) -> Result<&mut [T], BufferError> {
        // SAFETY: `alloc` is owned by the array and is the only allocator
        // ever handed to `raw`.
        let slots = unsafe { self.raw.reserve(extra, &self.alloc)? };
        self.reserved = extra;
        // SAFETY: the engine zeroed exactly `extra` slots at `slots`, and a
        // zeroed `T` is valid.
        Ok(unsafe { slots_mut(slots, extra) })
    }

    /// Make `num` slots of the most recent reservation live.
    ///
    /// # Errors
    ///
    /// [`BufferError::CommitOverrun`] if `num` exceeds the slots still
    /// reserved; any call other than `reserve` or `commit` drops the
    /// reservation.
    pub fn commit(&mut self, num: usize) -> Result<(), BufferError> {
        if num > self.reserved {
            return Err(BufferError::CommitOverrun {
                requested: num,
                reserved: self.reserved,
            });
        }
        // SAFETY: the slots were zeroed by `reserve` and lie within capacity.
        unsafe { self.raw.set_len(self.len() + num) };
        self.reserved -= num;
        Ok(())
    }

    /// Append one zeroed element and return it for the caller to fill.
    ///
    /// # Errors
    ///
    /// [`BufferError::AllocationFailed`] or [`BufferError::CapacityOverflow`];
    /// the array is unchanged.
    pub fn append(&mut self) -> Result<&mut T, BufferError> {
        // SAFETY: as in `reserve`, `alloc` is the array's sole allocator.
        let slot = unsafe { self.raw.append(&self.alloc)? };
        self.reserved = 0;
        // SAFETY: the slot is live, zeroed, aligned and exclusively borrowed.
        Ok(unsafe { &mut *slot.cast::<T>().as_ptr() })
    }

    /// Append `value`.
    ///
    /// # Errors
    ///
    /// As for [`append`](Self::append).
    pub fn push(&mut self, value: T) -> Result<&mut T, BufferError> {
        let slot = self.append()?;
        *slot = value;
        Ok(slot)
    }

    /// Append a copy of `items`, returning the newly appended elements.
    ///
    /// # Errors
    ///
    /// As for [`reserve`](Self::reserve); nothing is appended on error.
    pub fn append_many(&mut self, items: &[T]) -> Result<&mut [T], BufferError> {
        // SAFETY: `items` is a live slice of `T`, and the borrow checker
        // rules out it aliasing our storage while `self` is borrowed mutably.
        // `alloc` is the array's sole allocator.
        let slots = unsafe {
            self.raw
                .append_many(items.as_ptr().cast::<u8>(), items.len(), &self.alloc)?
        };
        self.reserved = 0;
        // SAFETY: the appended slots are live and hold copies of `items`.
        Ok(unsafe { slots_mut(slots, items.len()) })
    }

    /// Append a copy of this array's own elements in `range`.
    ///
    /// # Errors
    ///
    /// [`BufferError::IndexOutOfRange`] if `range` is not within the live
    /// elements, otherwise as for [`reserve`](Self::reserve).
    pub fn append_within(&mut self, range: Range<usize>) -> Result<&mut [T], BufferError> {
        let num = range.end.saturating_sub(range.start);
        // SAFETY: `alloc` is the array's sole allocator.
        let slots = unsafe { self.raw.append_within(range, &self.alloc)? };
        self.reserved = 0;
        // SAFETY: the appended slots are live copies of existing elements.
        Ok(unsafe { slots_mut(slots, num) })
    }

    /// Insert `num` zeroed elements at `index`, shifting later elements up,
    /// and return the inserted slots.
    ///
    /// `num == 0` does nothing, even when `index` is past the end.
    ///
    /// # Errors
    ///
    /// [`BufferError::IndexOutOfRange`] if `num > 0` and `index > len`,
    /// otherwise as for [`reserve`](Self::reserve). The array is unchanged
    /// on error.
    pub fn insert(&mut self, index: usize, num: usize) -> Result<&mut [T], BufferError> {
        // SAFETY: `alloc` is the array's sole allocator.
        let gap = unsafe { self.raw.insert(index, num, &self.alloc)? };
        if num == 0 {
            return Ok(&mut []);
        }
        self.reserved = 0;
        // SAFETY: the gap is `num` live, zeroed slots starting at `index`.
        Ok(unsafe { slots_mut(gap, num) })
    }

    /// Remove `num` elements starting at `index`, shifting later elements
    /// down. Capacity is never reduced.
    ///
    /// `num >= len` clears the array whatever `index` is. An `index` at or
    /// past the end is otherwise a no-op, and a range running past the end
    /// stops at the end.
    ///
    /// Returns the elements that now start at `index`, i.e. the tail that was
    /// shifted down. It is empty when the array was cleared or nothing was
    /// removed past the end.
    pub fn remove(&mut self, index: usize, num: usize) -> &mut [T] {
        self.raw.remove(index, num);
        self.reserved = 0;
        let start = index.min(self.len());
        &mut self.as_mut_slice()[start..]
    }

    /// Drop all elements but keep the allocation for reuse.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.reserved = 0;
    }

    /// Return the allocation to the allocator. The array stays usable and
    /// is indistinguishable from a new one.
    pub fn release(&mut self) {
        // SAFETY: `alloc` grew every region `raw` has held.
        unsafe { self.raw.release(&self.alloc) };
        self.reserved = 0;
    }
}

/// View `len` slots starting at `ptr` as a mutable slice.
///
/// # Safety
///
/// The slots must be initialised `T`s within one allocation (or `len == 0`
/// with an aligned pointer) and not otherwise borrowed for `'a`.
unsafe fn slots_mut<'a, T>(ptr: NonNull<u8>, len: usize) -> &'a mut [T] {
    // SAFETY: forwarded to the caller.
    unsafe { std::slice::from_raw_parts_mut(ptr.cast::<T>().as_ptr(), len) }
}

impl<T, A: Allocator> Drop for Yar<T, A> {
    fn drop(&mut self) {
        // SAFETY: `alloc` grew every region `raw` has held.
        unsafe { self.raw.release(&self.alloc) };
    }
}

impl<T: Zeroable + Copy, A: Allocator> Deref for Yar<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Zeroable + Copy, A: Allocator> DerefMut for Yar<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T: Zeroable + Copy, A: Allocator> IntoIterator for &'a Yar<T, A> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: Zeroable + Copy + fmt::Debug, A: Allocator> fmt::Debug for Yar<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Yar")
            .field("items", &self.as_slice())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_write() {
        let mut ints: Yar<i32> = Yar::new();
        *ints.append().unwrap() = 10;
        *ints.append().unwrap() = 20;
        *ints.append().unwrap() = 30;
        assert_eq!(ints.as_slice(), &[10, 20, 30]);
        assert_eq!(ints.capacity(), GrowthPolicy::DEFAULT_MIN_CAPACITY);
    }

    #[test]
    fn appended_slots_start_zeroed() {
        let mut ints: Yar<i32> = Yar::new();
        for _ in 0..1000 {
            assert_eq!(*ints.append().unwrap(), 0);
        }
        assert_eq!(ints.len(), 1000);
        assert!(ints.iter().all(|&v| v == 0));
    }

    #[test]
    fn reset_then_reuse_zeroes_stale_slots() {
        let mut ints: Yar<u64> = Yar::new();
        ints.append_many(&[7, 8, 9]).unwrap();
        let cap = ints.capacity();
        ints.reset();
        assert!(ints.is_empty());
        assert_eq!(ints.capacity(), cap);
        assert_eq!(*ints.append().unwrap(), 0);
    }

    #[test]
    fn reserve_twice_returns_same_slots() {
        let mut values: Yar<f64> = Yar::new();
        let first = values.reserve(10).unwrap().as_ptr();
        let second = values.reserve(10).unwrap().as_ptr();
        assert_eq!(first, second);
        assert_eq!(values.len(), 0);
    }

    #[test]
    fn commit_makes_reserved_slots_live() {
        let mut values: Yar<u16> = Yar::new();
        let slots = values.reserve(4).unwrap();
        slots[0] = 1;
        slots[1] = 2;
        values.commit(2).unwrap();
        assert_eq!(values.as_slice(), &[1, 2]);
        values.commit(2).unwrap();
        assert_eq!(values.as_slice(), &[1, 2, 0, 0]);
    }

    #[test]
    fn commit_beyond_reservation_is_rejected() {
        let mut values: Yar<u16> = Yar::new();
        values.reserve(2).unwrap();
        assert_eq!(
            values.commit(3),
            Err(BufferError::CommitOverrun {
                requested: 3,
                reserved: 2
            })
        );
        values.push(5).unwrap();
        assert!(matches!(
            values.commit(1),
            Err(BufferError::CommitOverrun { reserved: 0, .. })
        ));
        assert_eq!(values.as_slice(), &[5]);
    }

    #[test]
    fn append_many_returns_appended_slice() {
        let mut text: Yar<u8> = Yar::new();
        text.append_many(b"Hello, ").unwrap();
        let tail = text.append_many(b"there!").unwrap();
        assert_eq!(tail, b"there!");
        assert_eq!(text.as_slice(), b"Hello, there!");
    }

    #[test]
    fn append_within_doubles_content() {
        let mut text: Yar<u8> = Yar::new();
        text.append_many(b"abc").unwrap();
        text.append_within(0..text.len()).unwrap();
        assert_eq!(text.as_slice(), b"abcabc");
    }

    #[test]
    fn insert_in_middle_yields_writable_zero() {
        let mut ints: Yar<i32> = Yar::new();
        ints.append_many(&[10, 20]).unwrap();
        let gap = ints.insert(1, 1).unwrap();
        assert_eq!(gap, &[0]);
        gap[0] = 15;
        assert_eq!(ints.as_slice(), &[10, 15, 20]);
    }

    #[test]
    fn insert_zero_anywhere_is_noop() {
        let mut ints: Yar<i32> = Yar::new();
        assert!(ints.insert(42, 0).unwrap().is_empty());
        assert_eq!(ints.len(), 0);
        assert_eq!(ints.capacity(), 0);
    }

    #[test]
    fn zero_sized_elements_are_counted() {
        let mut units: Yar<()> = Yar::new();
        for _ in 0..20 {
            units.append().unwrap();
        }
        assert_eq!(units.len(), 20);
        units.remove(0, 5);
        assert_eq!(units.len(), 15);
    }

    #[test]
    fn release_resets_to_fresh_state() {
        let mut ints: Yar<i32> = Yar::new();
        ints.append_many(&[1, 2, 3]).unwrap();
        ints.release();
        ints.release();
        assert_eq!(ints.len(), 0);
        assert_eq!(ints.capacity(), 0);
        ints.push(4).unwrap();
        assert_eq!(ints.as_slice(), &[4]);
    }

    #[test]
    fn debug_lists_items() {
        let mut ints: Yar<i32> = Yar::new();
        ints.append_many(&[1, 2]).unwrap();
        let shown = format!("{ints:?}");
        assert!(shown.contains("[1, 2]"));
        assert!(shown.contains("capacity: 16"));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = GrowthPolicy {
            growth_numerator: 9,
            ..GrowthPolicy::default()
        };
        assert!(Yar::<u8, Heap>::with_policy_in(policy, Heap).is_err());
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Push(u32),
            AppendMany(Vec<u32>),
            AppendWithin(usize, usize),
            Insert(usize, usize),
            Remove(usize, usize),
            Reset,
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => any::<u32>().prop_map(Op::Push),
                2 => proptest::collection::vec(any::<u32>(), 0..40).prop_map(Op::AppendMany),
                1 => (0usize..64, 0usize..64).prop_map(|(a, b)| Op::AppendWithin(a, b)),
                2 => (0usize..80, 0usize..8).prop_map(|(i, n)| Op::Insert(i, n)),
                2 => (0usize..80, 0usize..20).prop_map(|(i, n)| Op::Remove(i, n)),
                1 => Just(Op::Reset),
            ]
        }

        fn apply_model(model: &mut Vec<u32>, op: &Op) {
            match *op {
                Op::Push(v) => model.push(v),
                Op::AppendMany(ref vs) => model.extend_from_slice(vs),
                Op::AppendWithin(a, b) => {
                    if a <= b && b <= model.len() {
                        model.extend_from_within(a..b);
                    }
                }
                Op::Insert(i, n) => {
                    if n > 0 && i <= model.len() {
                        model.splice(i..i, std::iter::repeat_n(0, n));
                    }
                }
                Op::Remove(i, n) => {
                    if n >= model.len() {
                        model.clear();
                    } else if i < model.len() {
                        let end = (i + n).min(model.len());
                        model.drain(i..end);
                    }
                }
                Op::Reset => model.clear(),
            }
        }

        fn apply(yar: &mut Yar<u32>, op: &Op) {
            let len = yar.len();
            match *op {
                Op::Push(v) => {
                    yar.push(v).unwrap();
                }
                Op::AppendMany(ref vs) => {
                    yar.append_many(vs).unwrap();
                }
                Op::AppendWithin(a, b) => {
                    let result = yar.append_within(a..b);
                    assert_eq!(result.is_ok(), a <= b && b <= len);
                }
                Op::Insert(i, n) => {
                    let result = yar.insert(i, n);
                    assert_eq!(result.is_ok(), n == 0 || i <= len);
                }
                Op::Remove(i, n) => {
                    yar.remove(i, n);
                }
                Op::Reset => yar.reset(),
            }
        }

        proptest! {
            #[test]
            fn matches_vec_model(ops in proptest::collection::vec(arb_op(), 1..60)) {
                let mut yar: Yar<u32> = Yar::new();
                let mut model = Vec::new();
                let mut last_capacity = 0;
                for op in &ops {
                    apply(&mut yar, op);
                    apply_model(&mut model, op);
                    prop_assert_eq!(yar.as_slice(), model.as_slice());
                    prop_assert!(yar.len() <= yar.capacity());
                    prop_assert!(yar.capacity() >= last_capacity);
                    last_capacity = yar.capacity();
                }
            }

            #[test]
            fn capacity_is_floor_until_exceeded(n in 1usize..=16) {
                let mut yar: Yar<u8> = Yar::new();
                for _ in 0..n {
                    yar.append().unwrap();
                }
                prop_assert_eq!(yar.capacity(), 16);
            }
        }
    }
}
