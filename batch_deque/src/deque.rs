use core::cmp;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Bound, Index, IndexMut, RangeBounds};
use core::ptr::{self, NonNull};

use allocator_api2::alloc::{Allocator, Global};
use devector::guards::AllocationGuard;
use devector::{infallible, raw, DefaultGrowthPolicy, Devector, Error};

use crate::iter::{Iter, IterMut, Segments, SegmentsMut};
use crate::position::Slot;

pub(crate) type SegmentMap<T, A> = Devector<NonNull<T>, 0, DefaultGrowthPolicy, A>;

/// A double-ended queue stored in fixed-size segments.
///
/// Elements live in heap segments of `SEGMENT_SIZE` slots. A devector of
/// segment pointers (the map) keeps them in order. Pushing at either end
/// never moves an existing element: when the boundary segment is full a new
/// segment is allocated and only the map grows. References obtained through
/// [`get`](Self::get) or the iterators therefore stay valid across
/// `push_front`, `push_back`, `reserve_*` and
/// [`stable_insert`](Self::stable_insert).
///
/// ```
/// use batch_deque::BatchDeque;
///
/// let mut dq: BatchDeque<u32, 4> = BatchDeque::new();
/// dq.extend([3, 4, 5]);
/// dq.push_front(2);
/// dq.push_front(1);
/// assert_eq!(dq, [1, 2, 3, 4, 5]);
/// assert_eq!(dq.segments().count(), 2);
/// ```
pub struct BatchDeque<T, const SEGMENT_SIZE: usize = 512, A: Allocator = Global> {
    pub(crate) map: SegmentMap<T, A>,
    pub(crate) begin: Slot,
    pub(crate) end: Slot,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, const SEGMENT_SIZE: usize, A: Allocator + Send> Send
    for BatchDeque<T, SEGMENT_SIZE, A>
{
}

unsafe impl<T: Sync, const SEGMENT_SIZE: usize, A: Allocator + Sync> Sync
    for BatchDeque<T, SEGMENT_SIZE, A>
{
}

impl<T, const SEGMENT_SIZE: usize> BatchDeque<T, SEGMENT_SIZE, Global> {
    /// Creates an empty deque. No segment is allocated until the first push.
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(SEGMENT_SIZE > 1, "segment size must be greater than one") };
        Self {
            map: Devector::new(),
            begin: Slot::ZERO,
            end: Slot::ZERO,
            _marker: PhantomData,
        }
    }

    /// Creates a deque holding `len` clones of `value`.
    #[must_use]
    pub fn from_elem(value: T, len: usize) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(value, len, Global)
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> BatchDeque<T, SEGMENT_SIZE, A> {
    #[must_use]
    pub fn new_in(alloc: A) -> Self {
        const { assert!(SEGMENT_SIZE > 1, "segment size must be greater than one") };
        Self {
            map: Devector::new_in(alloc),
            begin: Slot::ZERO,
            end: Slot::ZERO,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn from_elem_in(value: T, len: usize, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut dq = Self::new_in(alloc);
        dq.resize_back(len, value);
        dq
    }

    /// The allocator shared by the segments and the segment map.
    #[must_use]
    pub fn allocator(&self) -> &A {
        self.map.allocator()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.begin.distance::<SEGMENT_SIZE>(self.end)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Total number of slots in the allocated segments.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.map.len() * SEGMENT_SIZE
    }

    /// Number of `push_front` calls that succeed without allocating a segment.
    #[must_use]
    pub fn front_free_capacity(&self) -> usize {
        self.begin.linear::<SEGMENT_SIZE>()
    }

    /// Number of `push_back` calls that succeed without allocating a segment.
    #[must_use]
    pub fn back_free_capacity(&self) -> usize {
        self.capacity() - self.end.linear::<SEGMENT_SIZE>()
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        cmp::min(
            self.map.max_size().saturating_mul(SEGMENT_SIZE),
            isize::MAX as usize,
        )
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len() {
            Some(unsafe { &*self.ptr_at(index) })
        } else {
            None
        }
    }

    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len() {
            Some(unsafe { &mut *self.ptr_at(index) })
        } else {
            None
        }
    }

    /// Checked element access.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfRange` if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, Error> {
        let length = self.len();
        self.get(index)
            .ok_or(Error::IndexOutOfRange { index, length })
    }

    /// Checked mutable element access.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfRange` if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, Error> {
        let length = self.len();
        self.get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, length })
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.get_mut(0)
    }

    #[must_use]
    pub fn back(&self) -> Option<&T> {
        let last = self.len().checked_sub(1)?;
        self.get(last)
    }

    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let last = self.len().checked_sub(1)?;
        self.get_mut(last)
    }

    pub fn push_front(&mut self, value: T) {
        self.emplace_front(|| value);
    }

    pub fn push_back(&mut self, value: T) {
        self.emplace_back(|| value);
    }

    /// Constructs an element at the front from `f` and returns it.
    ///
    /// When the first segment is full a new segment is allocated in front
    /// of it; no element moves. If `f` panics the deque is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the segment map cannot grow.
    pub fn emplace_front<F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        if self.begin == Slot::ZERO {
            infallible(self.emplace_front_slow(f));
        } else {
            let slot = self.begin.offset::<SEGMENT_SIZE>(-1);
            unsafe { self.slot_ptr(slot).write(f()) };
            self.begin = slot;
        }
        debug_assert!(self.invariants_ok());
        unsafe { &mut *self.slot_ptr(self.begin) }
    }

    /// Constructs an element at the back from `f` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the segment map cannot grow.
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        let slot = self.end;
        if slot.segment == self.map.len() {
            infallible(self.emplace_back_slow(f));
        } else {
            unsafe { self.slot_ptr(slot).write(f()) };
            self.end = slot.offset::<SEGMENT_SIZE>(1);
        }
        debug_assert!(self.invariants_ok());
        let last = self.end.offset::<SEGMENT_SIZE>(-1);
        unsafe { &mut *self.slot_ptr(last) }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = unsafe { self.slot_ptr(self.begin).read() };
        self.begin = self.begin.offset::<SEGMENT_SIZE>(1);
        Some(value)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.end = self.end.offset::<SEGMENT_SIZE>(-1);
        Some(unsafe { self.slot_ptr(self.end).read() })
    }

    /// Inserts `value` so that it ends up at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        self.emplace(index, || value)
    }

    /// Constructs an element from `f` at position `index`.
    ///
    /// The element is pushed at the nearer end and rotated into place, so
    /// the elements between that end and `index` move by one slot. If `f`
    /// panics the deque is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn emplace<F: FnOnce() -> T>(&mut self, index: usize, f: F) -> &mut T {
        let len = self.len();
        self.check_insert_index(index);
        if index < len - index {
            self.emplace_front(f);
            self.rotate_left(0, index + 1, 1);
        } else {
            self.emplace_back(f);
            self.rotate_left(index, len + 1, len - index);
        }
        debug_assert!(self.invariants_ok());
        unsafe { &mut *self.ptr_at(index) }
    }

    /// Clones `items` into the deque starting at `index`. If a clone panics
    /// the deque is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert_slice(&mut self, index: usize, items: &[T])
    where
        T: Clone,
    {
        self.check_insert_index(index);
        self.insert_with(index, items.len(), |i| items[i].clone());
    }

    /// Inserts `count` clones of `value` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert_n(&mut self, index: usize, count: usize, value: &T)
    where
        T: Clone,
    {
        self.check_insert_index(index);
        self.insert_with(index, count, |_| value.clone());
    }

    /// Inserts the items of `iter` at `index`.
    ///
    /// The items are pushed at the back, then rotated into place. If the
    /// iterator panics, the items pushed so far are dropped again.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) {
        self.check_insert_index(index);
        let len = self.len();
        let mut rollback = Rollback::back(self);
        for item in iter {
            rollback.deque.push_back(item);
        }
        rollback.commit();
        let added = self.len() - len;
        self.rotate_left(index, len + added, len - index);
        debug_assert!(self.invariants_ok());
    }

    /// Inserts the items of `iter` without moving any element already in
    /// the deque, and returns the index of the first inserted item.
    ///
    /// - `hint == len()`: the items are pushed at the back.
    /// - `hint` in the first segment: the items are pushed at the front.
    /// - Otherwise the items are inserted at the start of the segment that
    ///   holds `hint`. They are collected into whole segments (the last one
    ///   padded with `T::default()` values that stay in the deque) whose
    ///   pointers are spliced into the segment map.
    ///
    /// Pointers and references to the elements present before the call
    /// keep pointing at the same elements. If the iterator or `T::default`
    /// panics the deque is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `hint > len()`.
    pub fn stable_insert<I>(&mut self, hint: usize, iter: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Default,
        A: Clone,
    {
        let len = self.len();
        self.check_insert_index(hint);

        if hint == len {
            let mut rollback = Rollback::back(self);
            for item in iter {
                rollback.deque.push_back(item);
            }
            rollback.commit();
            return hint;
        }

        let target = self.begin.offset::<SEGMENT_SIZE>(hint as isize).segment;
        if target == self.begin.segment {
            let mut staged: Devector<T> = iter.into_iter().collect();
            if staged.is_empty() {
                return hint;
            }
            let mut rollback = Rollback::front(self);
            while let Some(item) = staged.pop_back() {
                rollback.deque.push_front(item);
            }
            rollback.commit();
            return 0;
        }

        let mut batch = Self::new_in(self.allocator().clone());
        batch.extend(iter);
        if batch.is_empty() {
            return hint;
        }
        let padding = (SEGMENT_SIZE - batch.end.index) % SEGMENT_SIZE;
        batch.resize_back_with(batch.len() + padding, T::default);

        let (first, last) = (batch.begin.segment, batch.end.segment);
        self.map.insert_slice(target, &batch.map[first..last]);
        batch.map.erase(first..last);
        batch.begin = Slot::ZERO;
        batch.end = Slot::ZERO;

        self.end.segment += last - first;
        debug_assert!(self.invariants_ok());
        (target - self.begin.segment) * SEGMENT_SIZE - self.begin.index
    }

    /// Removes and returns the element at `index`, closing the gap from
    /// the shorter side.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.len() {
            return None;
        }
        let value = unsafe { self.ptr_at(index).read() };
        self.close_gap(index, index + 1);
        debug_assert!(self.invariants_ok());
        Some(value)
    }

    /// Drops the elements in `range` and closes the gap by moving whichever
    /// side has fewer elements.
    ///
    /// # Panics
    ///
    /// Panics if the range is decreasing or ends past `len()`.
    pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
        let (first, last) = bounds(range, self.len());
        if first == last {
            return;
        }
        let (begin, end) = (self.begin, self.end);
        let from = begin.offset::<SEGMENT_SIZE>(first as isize);
        let to = begin.offset::<SEGMENT_SIZE>(last as isize);

        // Hidden while dropping: a panicking destructor leaks, never double-drops.
        self.end = begin;
        self.drop_range(from, to);
        self.end = end;

        self.close_gap(first, last);
        debug_assert!(self.invariants_ok());
    }

    /// Drops all elements. The segments are kept; see
    /// [`shrink_to_fit`](Self::shrink_to_fit).
    pub fn clear(&mut self) {
        let (begin, end) = (self.begin, self.end);
        self.begin = Slot::ZERO;
        self.end = Slot::ZERO;
        self.drop_range(begin, end);
    }

    /// Keeps the first `len` elements, dropping the rest.
    pub fn truncate_back(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let old_end = self.end;
        self.end = self.begin.offset::<SEGMENT_SIZE>(len as isize);
        self.drop_range(self.end, old_end);
    }

    /// Keeps the last `len` elements, dropping the rest.
    pub fn truncate_front(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let old_begin = self.begin;
        self.begin = self.end.offset::<SEGMENT_SIZE>(-(len as isize));
        self.drop_range(old_begin, self.begin);
    }

    pub fn truncate(&mut self, len: usize) {
        self.truncate_back(len);
    }

    /// Resizes at the back, filling with clones of `value`.
    pub fn resize_back(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_back_with(new_len, || value.clone());
    }

    /// Resizes at the back, filling with values produced by `f`.
    ///
    /// Growing is strong: if `f` panics, the elements added so far are
    /// dropped and the deque has its old length again.
    pub fn resize_back_with<F: FnMut() -> T>(&mut self, new_len: usize, mut f: F) {
        let len = self.len();
        if new_len <= len {
            self.truncate_back(new_len);
            return;
        }
        self.reserve_back(new_len - len);
        let mut rollback = Rollback::back(self);
        for _ in len..new_len {
            rollback.deque.emplace_back(&mut f);
        }
        rollback.commit();
        debug_assert!(self.invariants_ok());
    }

    /// Resizes at the front, filling with clones of `value`.
    pub fn resize_front(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_front_with(new_len, || value.clone());
    }

    /// Resizes at the front. New elements are produced by `f` in order from
    /// the new first element towards the old one.
    ///
    /// Growing is strong: if `f` panics, the elements added so far are
    /// dropped and the deque has its old length again.
    pub fn resize_front_with<F: FnMut() -> T>(&mut self, new_len: usize, mut f: F) {
        let len = self.len();
        if new_len <= len {
            self.truncate_front(new_len);
            return;
        }
        let added = new_len - len;
        self.reserve_front(added);
        let mut rollback = Rollback::front(self);
        for _ in 0..added {
            rollback.deque.emplace_front(&mut f);
        }
        rollback.commit();
        // Pushed outwards, so the run is back to front.
        self.reverse(0, added);
        debug_assert!(self.invariants_ok());
    }

    /// Same as [`resize_back`](Self::resize_back).
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_back(new_len, value);
    }

    /// Ensures at least `additional` free slots before the first element by
    /// allocating whole segments.
    ///
    /// # Panics
    ///
    /// Panics if the length would exceed [`max_size`](Self::max_size).
    pub fn reserve_front(&mut self, additional: usize) {
        infallible(self.try_reserve_front(additional));
    }

    /// Ensures at least `additional` free slots after the last element.
    ///
    /// # Panics
    ///
    /// Panics if the length would exceed [`max_size`](Self::max_size).
    pub fn reserve_back(&mut self, additional: usize) {
        infallible(self.try_reserve_back(additional));
    }

    /// Fallible [`reserve_front`](Self::reserve_front).
    ///
    /// # Errors
    ///
    /// Returns `Error::LengthExceeded` if the length would exceed
    /// [`max_size`](Self::max_size) and `Error::AllocFailed` if a segment
    /// cannot be allocated. The elements are unchanged in both cases;
    /// segments allocated before an allocation failure are kept.
    pub fn try_reserve_front(&mut self, additional: usize) -> Result<(), Error> {
        let free = self.front_free_capacity();
        if free >= additional {
            return Ok(());
        }
        self.check_length(additional)?;
        let segments = (additional - free).div_ceil(SEGMENT_SIZE);
        if self.map.front_free_capacity() < segments {
            let growth = cmp::max(segments, self.map_growth());
            self.map.try_reserve_front(growth)?;
        }
        for _ in 0..segments {
            let segment = raw::allocate::<T, A>(self.map.allocator(), SEGMENT_SIZE)?;
            unsafe { self.map.push_front_unchecked(segment) };
            self.begin.segment += 1;
            self.end.segment += 1;
        }
        debug_assert!(self.invariants_ok());
        Ok(())
    }

    /// Fallible [`reserve_back`](Self::reserve_back).
    ///
    /// # Errors
    ///
    /// Same as [`try_reserve_front`](Self::try_reserve_front).
    pub fn try_reserve_back(&mut self, additional: usize) -> Result<(), Error> {
        let free = self.back_free_capacity();
        if free >= additional {
            return Ok(());
        }
        self.check_length(additional)?;
        let segments = (additional - free).div_ceil(SEGMENT_SIZE);
        if self.map.back_free_capacity() < segments {
            let growth = cmp::max(segments, self.map_growth());
            self.map.try_reserve_back(growth)?;
        }
        for _ in 0..segments {
            let segment = raw::allocate::<T, A>(self.map.allocator(), SEGMENT_SIZE)?;
            unsafe { self.map.push_back_unchecked(segment) };
        }
        debug_assert!(self.invariants_ok());
        Ok(())
    }

    /// Frees the segments that hold no element. An empty deque releases
    /// all of its memory. Calling it again has no further effect.
    pub fn shrink_to_fit(&mut self) {
        let segments = self.map.len();
        if self.is_empty() {
            self.release_segments(0, segments);
            self.map.clear();
            self.begin = Slot::ZERO;
            self.end = Slot::ZERO;
        } else {
            let used_end = self.end.segment + usize::from(self.end.index > 0);
            self.release_segments(used_end, segments);
            self.map.truncate_back(used_end);

            let unused_front = self.begin.segment;
            self.release_segments(0, unused_front);
            self.map.truncate_front(used_end - unused_front);
            self.begin.segment -= unused_front;
            self.end.segment -= unused_front;
        }
        self.map.shrink_to_fit();
        debug_assert!(self.invariants_ok());
    }

    /// Exchanges the contents of two deques, allocators included. No
    /// element moves.
    pub fn swap(&mut self, other: &mut Self) {
        self.map.swap(&mut other.map);
        mem::swap(&mut self.begin, &mut other.begin);
        mem::swap(&mut self.end, &mut other.end);
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_, T, SEGMENT_SIZE> {
        Iter::new(&self.map, self.begin, self.end)
    }

    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, T, SEGMENT_SIZE> {
        IterMut::new(&self.map, self.begin, self.end)
    }

    /// The live part of every segment, front to back, as slices.
    ///
    /// This is the bulk interface: each item is one contiguous run of
    /// elements, suitable for a single `write` call.
    #[must_use]
    pub fn segments(&self) -> Segments<'_, T, SEGMENT_SIZE> {
        Segments::new(&self.map, self.begin, self.end)
    }

    /// Mutable form of [`segments`](Self::segments).
    #[must_use]
    pub fn segments_mut(&mut self) -> SegmentsMut<'_, T, SEGMENT_SIZE> {
        SegmentsMut::new(&self.map, self.begin, self.end)
    }

    /// Checks the slot invariants: `begin <= end`, both normalized, both
    /// within the segment map, and no slots set while the map is empty.
    #[must_use]
    pub fn invariants_ok(&self) -> bool {
        let segments = self.map.len();
        self.begin <= self.end
            && self.begin.index < SEGMENT_SIZE
            && self.end.index < SEGMENT_SIZE
            && self.end.segment <= segments
            && (self.end.index == 0 || self.end.segment < segments)
            && (segments > 0 || (self.begin == Slot::ZERO && self.end == Slot::ZERO))
            && self.map.invariants_ok()
    }

    #[inline]
    pub(crate) fn slot_ptr(&self, slot: Slot) -> *mut T {
        unsafe { self.map[slot.segment].as_ptr().add(slot.index) }
    }

    #[inline]
    fn ptr_at(&self, index: usize) -> *mut T {
        self.slot_ptr(self.begin.offset::<SEGMENT_SIZE>(index as isize))
    }

    fn map_growth(&self) -> usize {
        if self.map.is_empty() {
            4
        } else {
            self.map.len() / 2 + 1
        }
    }

    fn check_length(&self, additional: usize) -> Result<(), Error> {
        let max = self.max_size();
        match self.len().checked_add(additional) {
            Some(requested) if requested <= max => Ok(()),
            Some(requested) => Err(Error::LengthExceeded { requested, max }),
            None => Err(Error::LengthExceeded {
                requested: usize::MAX,
                max,
            }),
        }
    }

    fn check_insert_index(&self, index: usize) {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
    }

    fn emplace_front_slow<F: FnOnce() -> T>(&mut self, f: F) -> Result<(), Error> {
        if self.map.front_free_capacity() == 0 {
            let growth = self.map_growth();
            self.map.try_reserve_front(growth)?;
        }
        let segment = raw::allocate::<T, A>(self.map.allocator(), SEGMENT_SIZE)?;
        let guard = AllocationGuard::new(segment, SEGMENT_SIZE, self.map.allocator());
        unsafe { guard.as_ptr().add(SEGMENT_SIZE - 1).write(f()) };
        guard.release();

        unsafe { self.map.push_front_unchecked(segment) };
        self.begin = Slot::new(0, SEGMENT_SIZE - 1);
        self.end.segment += 1;
        Ok(())
    }

    fn emplace_back_slow<F: FnOnce() -> T>(&mut self, f: F) -> Result<(), Error> {
        if self.map.back_free_capacity() == 0 {
            let growth = self.map_growth();
            self.map.try_reserve_back(growth)?;
        }
        let segment = raw::allocate::<T, A>(self.map.allocator(), SEGMENT_SIZE)?;
        let guard = AllocationGuard::new(segment, SEGMENT_SIZE, self.map.allocator());
        unsafe { guard.as_ptr().write(f()) };
        guard.release();

        unsafe { self.map.push_back_unchecked(segment) };
        self.end = Slot::new(self.map.len() - 1, 1);
        Ok(())
    }

    /// Inserts `count` elements at `index`, pushing them at the nearer end
    /// and rotating them into place.
    fn insert_with<F: FnMut(usize) -> T>(&mut self, index: usize, count: usize, mut make: F) {
        if count == 0 {
            return;
        }
        let len = self.len();
        if index < len - index {
            self.reserve_front(count);
            let mut rollback = Rollback::front(self);
            for i in (0..count).rev() {
                rollback.deque.push_front(make(i));
            }
            rollback.commit();
            self.rotate_left(0, count + index, count);
        } else {
            self.reserve_back(count);
            let mut rollback = Rollback::back(self);
            for i in 0..count {
                rollback.deque.push_back(make(i));
            }
            rollback.commit();
            self.rotate_left(index, len + count, len - index);
        }
        debug_assert!(self.invariants_ok());
    }

    /// Rotates the elements in `[start, end)` left by `mid`.
    fn rotate_left(&mut self, start: usize, end: usize, mid: usize) {
        if mid == 0 || start + mid == end {
            return;
        }
        self.reverse(start, start + mid);
        self.reverse(start + mid, end);
        self.reverse(start, end);
    }

    fn reverse(&mut self, start: usize, end: usize) {
        let (mut i, mut j) = (start, end);
        while i + 1 < j {
            j -= 1;
            unsafe { ptr::swap(self.ptr_at(i), self.ptr_at(j)) };
            i += 1;
        }
    }

    /// Fills the vacated logical range `[first, last)` by moving the
    /// shorter side over it.
    fn close_gap(&mut self, first: usize, last: usize) {
        let len = self.len();
        let count = last - first;
        if first < len - last {
            for i in (0..first).rev() {
                unsafe { ptr::copy_nonoverlapping(self.ptr_at(i), self.ptr_at(i + count), 1) };
            }
            self.begin = self.begin.offset::<SEGMENT_SIZE>(count as isize);
        } else {
            for i in last..len {
                unsafe { ptr::copy_nonoverlapping(self.ptr_at(i), self.ptr_at(i - count), 1) };
            }
            self.end = self.end.offset::<SEGMENT_SIZE>(-(count as isize));
        }
    }

    /// Drops the elements in slots `[from, to)`, one segment run at a time.
    fn drop_range(&mut self, from: Slot, to: Slot) {
        let mut cursor = from;
        while cursor < to {
            let stop = if cursor.segment == to.segment {
                to.index
            } else {
                SEGMENT_SIZE
            };
            let run = ptr::slice_from_raw_parts_mut(self.slot_ptr(cursor), stop - cursor.index);
            unsafe { ptr::drop_in_place(run) };
            cursor = Slot::new(cursor.segment + 1, 0);
        }
    }

    fn release_segments(&mut self, first: usize, last: usize) {
        for segment in &self.map[first..last] {
            unsafe { raw::deallocate(self.map.allocator(), *segment, SEGMENT_SIZE) };
        }
    }
}

/// Drops the elements pushed at one end since it was created, unless
/// committed.
struct Rollback<'a, T, const SEGMENT_SIZE: usize, A: Allocator> {
    deque: &'a mut BatchDeque<T, SEGMENT_SIZE, A>,
    len: usize,
    at_front: bool,
}

impl<'a, T, const SEGMENT_SIZE: usize, A: Allocator> Rollback<'a, T, SEGMENT_SIZE, A> {
    fn front(deque: &'a mut BatchDeque<T, SEGMENT_SIZE, A>) -> Self {
        let len = deque.len();
        Self {
            deque,
            len,
            at_front: true,
        }
    }

    fn back(deque: &'a mut BatchDeque<T, SEGMENT_SIZE, A>) -> Self {
        let len = deque.len();
        Self {
            deque,
            len,
            at_front: false,
        }
    }

    fn commit(self) {
        mem::forget(self);
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> Drop for Rollback<'_, T, SEGMENT_SIZE, A> {
    fn drop(&mut self) {
        if self.at_front {
            self.deque.truncate_front(self.len);
        } else {
            self.deque.truncate_back(self.len);
        }
    }
}

/// Resolves `range` against a sequence of length `len`.
fn bounds<R: RangeBounds<usize>>(range: R, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end.saturating_add(1),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    assert!(start <= end, "range start {start} is greater than range end {end}");
    assert!(end <= len, "range end {end} is out of range for length {len}");
    (start, end)
}

/// Exchanges the contents of `a` and `b`; see [`BatchDeque::swap`].
pub fn swap<T, const SEGMENT_SIZE: usize, A: Allocator>(
    a: &mut BatchDeque<T, SEGMENT_SIZE, A>,
    b: &mut BatchDeque<T, SEGMENT_SIZE, A>,
) {
    a.swap(b);
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> Drop for BatchDeque<T, SEGMENT_SIZE, A> {
    fn drop(&mut self) {
        let (begin, end) = (self.begin, self.end);
        self.drop_range(begin, end);
        let segments = self.map.len();
        self.release_segments(0, segments);
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator + Default> Default
    for BatchDeque<T, SEGMENT_SIZE, A>
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, const SEGMENT_SIZE: usize, A: Allocator + Clone> Clone
    for BatchDeque<T, SEGMENT_SIZE, A>
{
    /// Copies segment by segment: the clone uses as many segments as there
    /// are live ones and keeps the offset of the first element.
    fn clone(&self) -> Self {
        let mut copy = Self::new_in(self.allocator().clone());
        let used = self.segments().len();
        infallible(copy.map.try_reserve_back(used));
        for _ in 0..used {
            let segment = infallible(raw::allocate::<T, A>(copy.map.allocator(), SEGMENT_SIZE));
            unsafe { copy.map.push_back_unchecked(segment) };
        }
        if used > 0 {
            copy.begin = Slot::new(0, self.begin.index);
            copy.end = copy.begin;
        }
        for item in self {
            unsafe { copy.slot_ptr(copy.end).write(item.clone()) };
            copy.end = copy.end.offset::<SEGMENT_SIZE>(1);
        }
        copy
    }
}

impl<T: fmt::Debug, const SEGMENT_SIZE: usize, A: Allocator> fmt::Debug
    for BatchDeque<T, SEGMENT_SIZE, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> Index<usize> for BatchDeque<T, SEGMENT_SIZE, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!("index out of bounds: the len is {} but the index is {index}", self.len()),
        }
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> IndexMut<usize> for BatchDeque<T, SEGMENT_SIZE, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("index out of bounds: the len is {len} but the index is {index}"),
        }
    }
}
