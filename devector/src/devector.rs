use core::borrow::{Borrow, BorrowMut};
use core::cmp;
use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ops::{Bound, Deref, DerefMut, RangeBounds};
use core::ptr::{self, NonNull};
use core::slice;

use allocator_api2::alloc::{Allocator, Global};

use crate::error::{infallible, Error};
use crate::guards::{self, AllocationGuard, ConstructionGuard, Guard, NandGuard};
use crate::policy::{DefaultGrowthPolicy, GrowthPolicy};
use crate::raw;

/// A contiguous sequence with free capacity at both ends.
///
/// Elements live in slots `[front, back)` of a single buffer of `capacity`
/// slots. The buffer is the inline array of `N` slots while
/// `capacity <= N`, and a heap block obtained from `A` otherwise.
/// Pushing at either end is amortized O(1); the free slots before `front`
/// and after `back` are tracked separately, see
/// [`front_free_capacity`](Self::front_free_capacity) and
/// [`back_free_capacity`](Self::back_free_capacity).
///
/// ```
/// use devector::Devector;
///
/// let mut dv: Devector<i32, 4> = Devector::new();
/// dv.push_back(2);
/// dv.push_front(1);
/// dv.push_back(3);
/// assert_eq!(dv, [1, 2, 3]);
/// assert!(dv.is_inline());
/// ```
pub struct Devector<
    T,
    const N: usize = 0,
    G: GrowthPolicy = DefaultGrowthPolicy,
    A: Allocator = Global,
> {
    pub(crate) heap: NonNull<T>,
    pub(crate) capacity: usize,
    pub(crate) front: usize,
    pub(crate) back: usize,
    pub(crate) inline: MaybeUninit<[T; N]>,
    pub(crate) alloc: A,
    _marker: PhantomData<(T, fn() -> G)>,
}

unsafe impl<T: Send, const N: usize, G: GrowthPolicy, A: Allocator + Send> Send
    for Devector<T, N, G, A>
{
}

unsafe impl<T: Sync, const N: usize, G: GrowthPolicy, A: Allocator + Sync> Sync
    for Devector<T, N, G, A>
{
}

impl<T, const N: usize, G: GrowthPolicy> Devector<T, N, G, Global> {
    /// Creates an empty devector backed by the inline buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap: NonNull::dangling(),
            capacity: N,
            front: 0,
            back: 0,
            inline: MaybeUninit::uninit(),
            alloc: Global,
            _marker: PhantomData,
        }
    }

    /// Creates an empty devector with room for `capacity` elements at the back.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds [`max_size`](Self::max_size).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }

    /// Creates an empty devector able to take `front` pushes at the front
    /// and `back` pushes at the back without reallocating.
    ///
    /// # Panics
    ///
    /// Panics if `front + back` exceeds [`max_size`](Self::max_size).
    #[must_use]
    pub fn with_capacity_front_back(front: usize, back: usize) -> Self {
        Self::with_capacity_front_back_in(front, back, Global)
    }

    /// Creates a devector holding `len` clones of `value`.
    #[must_use]
    pub fn from_elem(value: T, len: usize) -> Self
    where
        T: Clone,
    {
        Self::from_elem_in(value, len, Global)
    }

    /// Creates a devector of `len` elements, the `i`-th being `f(i)`.
    #[must_use]
    pub fn from_fn<F: FnMut(usize) -> T>(len: usize, f: F) -> Self {
        Self::from_fn_in(len, f, Global)
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> Devector<T, N, G, A> {
    /// Creates an empty devector using `alloc` for heap storage.
    #[must_use]
    pub fn new_in(alloc: A) -> Self {
        Self {
            heap: NonNull::dangling(),
            capacity: N,
            front: 0,
            back: 0,
            inline: MaybeUninit::uninit(),
            alloc,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        Self::with_capacity_front_back_in(0, capacity, alloc)
    }

    /// Allocates exactly `max(front + back, N)` slots and places `front` of
    /// them before the (empty) live range.
    ///
    /// # Panics
    ///
    /// Panics if `front + back` exceeds [`max_size`](Self::max_size).
    #[must_use]
    pub fn with_capacity_front_back_in(front: usize, back: usize, alloc: A) -> Self {
        let mut dv = Self::new_in(alloc);
        let total = infallible(Self::sum(front, back).and_then(Self::checked_capacity));
        if total > N {
            dv.heap = infallible(raw::allocate::<T, A>(&dv.alloc, total));
            dv.capacity = total;
        }
        dv.front = front;
        dv.back = front;
        dv
    }

    #[must_use]
    pub fn from_elem_in(value: T, len: usize, alloc: A) -> Self
    where
        T: Clone,
    {
        Self::from_fn_in(len, |_| value.clone(), alloc)
    }

    #[must_use]
    pub fn from_fn_in<F: FnMut(usize) -> T>(len: usize, mut f: F, alloc: A) -> Self {
        let mut dv = Self::with_capacity_in(len, alloc);
        let mut guard = ConstructionGuard::new(dv.buffer_mut_ptr());
        for i in 0..len {
            unsafe { guard.construct(f(i)) };
        }
        dv.back = guard.commit();
        dv
    }

    /// Clones `items` into a devector of exactly `max(items.len(), N)` slots.
    #[must_use]
    pub fn from_slice_in(items: &[T], alloc: A) -> Self
    where
        T: Clone,
    {
        let mut dv = Self::with_capacity_in(items.len(), alloc);
        unsafe { guards::clone_into(items, dv.buffer_mut_ptr()) };
        dv.back = items.len();
        dv
    }

    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.back - self.front
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.front == self.back
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of `push_front` calls that succeed without reallocating.
    #[must_use]
    pub fn front_free_capacity(&self) -> usize {
        self.front
    }

    /// Number of `push_back` calls that succeed without reallocating.
    #[must_use]
    pub fn back_free_capacity(&self) -> usize {
        self.capacity - self.back
    }

    /// Whether the elements are stored in the inline buffer.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.capacity <= N
    }

    /// Largest length this devector can reach: the growth policy's cap or
    /// the largest array of `T` the address space allows, whichever is less.
    #[must_use]
    pub fn max_size(&self) -> usize {
        Self::max_size_bound()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buffer_ptr().add(self.front), self.len()) }
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();
        unsafe { slice::from_raw_parts_mut(self.buffer_mut_ptr().add(self.front), len) }
    }

    /// Pointer to the first element. Valid for `len()` reads.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        unsafe { self.buffer_ptr().add(self.front) }
    }

    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        unsafe { self.buffer_mut_ptr().add(self.front) }
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Checked element access.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfRange` if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, Error> {
        let length = self.len();
        self.as_slice()
            .get(index)
            .ok_or(Error::IndexOutOfRange { index, length })
    }

    /// Checked mutable element access.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfRange` if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, Error> {
        let length = self.len();
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, length })
    }

    pub fn push_front(&mut self, value: T) {
        self.emplace_front(|| value);
    }

    pub fn push_back(&mut self, value: T) {
        self.emplace_back(|| value);
    }

    /// Constructs an element at the front from `f` and returns it.
    ///
    /// When the front has no free slot the buffer grows according to `G`;
    /// the existing elements are placed so that the back keeps its free
    /// capacity. If `f` panics the devector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity would exceed [`max_size`](Self::max_size).
    pub fn emplace_front<F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        if self.front > 0 {
            let slot = unsafe { self.buffer_mut_ptr().add(self.front - 1) };
            unsafe { slot.write(f()) };
            self.front -= 1;
        } else {
            infallible(self.emplace_reallocating(true, 0, f));
        }
        debug_assert!(self.invariants_ok());
        unsafe { &mut *self.buffer_mut_ptr().add(self.front) }
    }

    /// Constructs an element at the back from `f` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity would exceed [`max_size`](Self::max_size).
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        if self.back < self.capacity {
            let slot = unsafe { self.buffer_mut_ptr().add(self.back) };
            unsafe { slot.write(f()) };
            self.back += 1;
        } else {
            let len = self.len();
            infallible(self.emplace_reallocating(false, len, f));
        }
        debug_assert!(self.invariants_ok());
        unsafe { &mut *self.buffer_mut_ptr().add(self.back - 1) }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = unsafe { self.buffer_ptr().add(self.front).read() };
        self.front += 1;
        Some(value)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.back -= 1;
        Some(unsafe { self.buffer_ptr().add(self.back).read() })
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
    /// The shorter of the two halves around `index` is shifted by one slot
    /// into the free capacity on its side; the other side is used when the
    /// preferred one has no room. With no free slot at all the buffer is
    /// reallocated and the element is constructed directly in the new
    /// buffer. If `f` panics the devector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()` or the capacity would exceed
    /// [`max_size`](Self::max_size).
    pub fn emplace<F: FnOnce() -> T>(&mut self, index: usize, f: F) -> &mut T {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
        let has_front_room = self.front > 0;
        let has_back_room = self.back < self.capacity;

        if index == len && has_back_room {
            let slot = unsafe { self.buffer_mut_ptr().add(self.back) };
            unsafe { slot.write(f()) };
            self.back += 1;
        } else if index == 0 && has_front_room {
            let slot = unsafe { self.buffer_mut_ptr().add(self.front - 1) };
            unsafe { slot.write(f()) };
            self.front -= 1;
        } else {
            let prefer_front = index <= len - index;
            if has_front_room && (!has_back_room || prefer_front) {
                let value = f();
                let front = self.front;
                let p = self.buffer_mut_ptr();
                unsafe {
                    ptr::copy(p.add(front), p.add(front - 1), index);
                    p.add(front - 1 + index).write(value);
                }
                self.front -= 1;
            } else if has_back_room {
                let value = f();
                let at = self.front + index;
                let p = self.buffer_mut_ptr();
                unsafe {
                    ptr::copy(p.add(at), p.add(at + 1), len - index);
                    p.add(at).write(value);
                }
                self.back += 1;
            } else {
                infallible(self.emplace_reallocating(prefer_front, index, f));
            }
        }
        debug_assert!(self.invariants_ok());
        unsafe { &mut *self.buffer_mut_ptr().add(self.front + index) }
    }

    /// Clones `items` into the devector starting at `index`.
    ///
    /// The new elements are built in the free slots near both ends and
    /// rotated into place, or in a new buffer when the free slots do not
    /// suffice. If a clone panics the devector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()` or the capacity would exceed
    /// [`max_size`](Self::max_size).
    pub fn insert_slice(&mut self, index: usize, items: &[T]) -> &mut [T]
    where
        T: Clone,
    {
        self.check_insert_index(index);
        infallible(self.insert_with(index, items.len(), |i| items[i].clone()));
        debug_assert!(self.invariants_ok());
        &mut self.as_mut_slice()[index..index + items.len()]
    }

    /// Inserts `count` clones of `value` at `index`. Same guarantees as
    /// [`insert_slice`](Self::insert_slice).
    ///
    /// # Panics
    ///
    /// Panics if `index > len()` or the capacity would exceed
    /// [`max_size`](Self::max_size).
    pub fn insert_n(&mut self, index: usize, count: usize, value: &T) -> &mut [T]
    where
        T: Clone,
    {
        self.check_insert_index(index);
        infallible(self.insert_with(index, count, |_| value.clone()));
        debug_assert!(self.invariants_ok());
        &mut self.as_mut_slice()[index..index + count]
    }

    /// Inserts the items of a single-pass iterator at `index`.
    ///
    /// The items are first collected into a temporary buffer, so a panicking
    /// iterator leaves the devector unchanged; they are then moved in with
    /// one relocation.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()` or the capacity would exceed
    /// [`max_size`](Self::max_size).
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) -> &mut [T] {
        self.check_insert_index(index);
        let mut staged: Devector<T> = iter.into_iter().collect();
        let count = staged.len();
        let src = staged.as_ptr();
        infallible(self.insert_with(index, count, |i| unsafe { src.add(i).read() }));
        staged.forget_elements();
        debug_assert!(self.invariants_ok());
        &mut self.as_mut_slice()[index..index + count]
    }

    /// Removes and returns the element at `index`, closing the gap from
    /// the shorter side.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let len = self.len();
        if index >= len {
            return None;
        }
        let front = self.front;
        let p = self.buffer_mut_ptr();
        let value = unsafe { p.add(front + index).read() };
        if index < len - index - 1 {
            unsafe { ptr::copy(p.add(front), p.add(front + 1), index) };
            self.front += 1;
        } else {
            unsafe { ptr::copy(p.add(front + index + 1), p.add(front + index), len - index - 1) };
            self.back -= 1;
        }
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
        let len = self.len();
        let (first, last) = bounds(range, len);
        let count = last - first;
        if count == 0 {
            return;
        }
        let (front, back) = (self.front, self.back);
        let p = self.buffer_mut_ptr();

        // Hidden while dropping: a panicking destructor leaks, never double-drops.
        self.back = front;
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(p.add(front + first), count)) };

        if first < len - last {
            unsafe { ptr::copy(p.add(front), p.add(front + count), first) };
            self.front = front + count;
            self.back = back;
        } else {
            unsafe { ptr::copy(p.add(front + last), p.add(front + first), len - last) };
            self.back = back - count;
        }
        debug_assert!(self.invariants_ok());
    }

    /// Drops all elements. The capacity is kept and moves entirely to the back.
    pub fn clear(&mut self) {
        let (front, len) = (self.front, self.len());
        let p = self.buffer_mut_ptr();
        self.front = 0;
        self.back = 0;
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(p.add(front), len)) };
    }

    /// Keeps the first `len` elements, dropping the rest.
    pub fn truncate_back(&mut self, len: usize) {
        let old_len = self.len();
        if len >= old_len {
            return;
        }
        let old_back = self.back;
        self.back = self.front + len;
        let p = self.buffer_mut_ptr();
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(p.add(self.back), old_back - self.back));
        }
    }

    /// Keeps the last `len` elements, dropping the rest.
    pub fn truncate_front(&mut self, len: usize) {
        let old_len = self.len();
        if len >= old_len {
            return;
        }
        let old_front = self.front;
        self.front += old_len - len;
        let p = self.buffer_mut_ptr();
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(p.add(old_front), old_len - len));
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.truncate_back(len);
    }

    /// Resizes at the back, filling with clones of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `new_len` exceeds [`max_size`](Self::max_size).
    pub fn resize_back(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_back_with(new_len, || value.clone());
    }

    /// Resizes at the back, filling with values produced by `f`.
    ///
    /// Growing is strong: if `f` panics, the elements it already produced
    /// are dropped and the devector is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `new_len` exceeds [`max_size`](Self::max_size).
    pub fn resize_back_with<F: FnMut() -> T>(&mut self, new_len: usize, f: F) {
        if new_len > self.len() {
            infallible(self.grow_back_with(new_len, f));
        } else {
            self.truncate_back(new_len);
        }
        debug_assert!(self.invariants_ok());
    }

    /// Resizes at the front, filling with clones of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `new_len` exceeds [`max_size`](Self::max_size).
    pub fn resize_front(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_front_with(new_len, || value.clone());
    }

    /// Resizes at the front. New elements are produced by `f` in order from
    /// the new first element towards the old one.
    ///
    /// # Panics
    ///
    /// Panics if `new_len` exceeds [`max_size`](Self::max_size).
    pub fn resize_front_with<F: FnMut() -> T>(&mut self, new_len: usize, f: F) {
        if new_len > self.len() {
            infallible(self.grow_front_with(new_len, f));
        } else {
            self.truncate_front(new_len);
        }
        debug_assert!(self.invariants_ok());
    }

    /// Same as [`resize_back`](Self::resize_back).
    ///
    /// # Panics
    ///
    /// Panics if `new_len` exceeds [`max_size`](Self::max_size).
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_back(new_len, value);
    }

    /// Ensures at least `additional` free slots before the first element.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity exceeds [`max_size`](Self::max_size).
    pub fn reserve_front(&mut self, additional: usize) {
        infallible(self.try_reserve_front(additional));
    }

    /// Ensures at least `additional` free slots after the last element.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity exceeds [`max_size`](Self::max_size).
    pub fn reserve_back(&mut self, additional: usize) {
        infallible(self.try_reserve_back(additional));
    }

    /// Fallible [`reserve_front`](Self::reserve_front). Reallocates to
    /// exactly the required capacity; the back keeps its free slots.
    ///
    /// # Errors
    ///
    /// Returns `Error::LengthExceeded` if the capacity would exceed
    /// [`max_size`](Self::max_size) and `Error::AllocFailed` if the
    /// allocator fails. The devector is unchanged in both cases.
    pub fn try_reserve_front(&mut self, additional: usize) -> Result<(), Error> {
        if self.front >= additional {
            return Ok(());
        }
        let total = Self::sum(self.len(), additional)
            .and_then(|n| Self::sum(n, self.back_free_capacity()))
            .and_then(Self::checked_capacity)?;
        self.reallocate_at(total, additional)?;
        debug_assert!(self.invariants_ok());
        Ok(())
    }

    /// Fallible [`reserve_back`](Self::reserve_back).
    ///
    /// # Errors
    ///
    /// Same as [`try_reserve_front`](Self::try_reserve_front).
    pub fn try_reserve_back(&mut self, additional: usize) -> Result<(), Error> {
        if self.back_free_capacity() >= additional {
            return Ok(());
        }
        let total = Self::sum(self.back, additional).and_then(Self::checked_capacity)?;
        let front = self.front;
        self.reallocate_at(total, front)?;
        debug_assert!(self.invariants_ok());
        Ok(())
    }

    /// Makes room for `additional` more elements at the back, growing by the
    /// policy rather than exactly. Used for size-hint reservations, where
    /// repeated small calls must stay amortized O(1).
    pub(crate) fn try_reserve_back_amortized(&mut self, additional: usize) -> Result<(), Error> {
        if self.back_free_capacity() >= additional {
            return Ok(());
        }
        let requested = Self::sum(self.back, additional)?;
        let total = self.calculate_new_capacity(requested)?;
        let front = self.front;
        self.reallocate_at(total, front)?;
        debug_assert!(self.invariants_ok());
        Ok(())
    }

    /// Releases unused memory when the growth policy agrees.
    ///
    /// Elements that fit into the inline buffer are moved there and the heap
    /// block is freed; otherwise the buffer is reallocated to exactly
    /// `len()` slots. Calling it again has no further effect.
    ///
    /// # Panics
    ///
    /// Aborts through `handle_alloc_error` if the smaller buffer cannot be
    /// allocated.
    pub fn shrink_to_fit(&mut self) {
        let len = self.len();
        if self.is_inline() || !G::should_shrink(len, self.capacity, N) {
            return;
        }
        if len <= N {
            let (heap, capacity) = (self.heap, self.capacity);
            unsafe {
                ptr::copy_nonoverlapping(
                    heap.as_ptr().add(self.front),
                    self.inline.as_mut_ptr().cast::<T>(),
                    len,
                );
                raw::deallocate(&self.alloc, heap, capacity);
            }
            self.heap = NonNull::dangling();
            self.capacity = N;
            self.front = 0;
            self.back = len;
        } else if self.capacity != len {
            infallible(self.reallocate_at(len, 0));
        }
        debug_assert!(self.invariants_ok());
    }

    /// Exchanges the contents of two devectors, allocators included.
    ///
    /// Heap-backed buffers are exchanged by pointer. An inline buffer cannot
    /// change owner, so inline elements are moved into the other side's
    /// inline array at the same offsets.
    pub fn swap(&mut self, other: &mut Self) {
        match (self.is_inline(), other.is_inline()) {
            (true, true) => {
                let start = cmp::min(self.front, other.front);
                let end = cmp::max(self.back, other.back);
                unsafe {
                    ptr::swap_nonoverlapping(
                        self.inline.as_mut_ptr().cast::<MaybeUninit<T>>().add(start),
                        other.inline.as_mut_ptr().cast::<MaybeUninit<T>>().add(start),
                        end - start,
                    );
                }
            }
            (true, false) => Self::move_inline_into(self, other),
            (false, true) => Self::move_inline_into(other, self),
            (false, false) => {}
        }
        core::mem::swap(&mut self.heap, &mut other.heap);
        core::mem::swap(&mut self.capacity, &mut other.capacity);
        core::mem::swap(&mut self.front, &mut other.front);
        core::mem::swap(&mut self.back, &mut other.back);
        core::mem::swap(&mut self.alloc, &mut other.alloc);
        debug_assert!(self.invariants_ok() && other.invariants_ok());
    }

    /// Replaces the contents with clones of `items`.
    ///
    /// - More elements than the capacity: one new buffer of exactly
    ///   `items.len()` slots; strong.
    /// - The whole new run fits in the free slots of either end: it is
    ///   built there and the old elements are dropped afterwards; strong.
    /// - Otherwise the buffer is overwritten in place (new elements in
    ///   the front free slots, assignment over the live ones, the rest in
    ///   the back free slots). A panicking clone leaves the old length
    ///   with some elements already reassigned.
    pub fn assign_from_slice(&mut self, items: &[T])
    where
        T: Clone,
    {
        let n = items.len();
        if n > self.capacity {
            infallible(self.assign_reallocating(items));
        } else if self.front >= n {
            let start = self.front - n;
            self.assign_beside(items, start);
        } else if self.back_free_capacity() >= n {
            let start = self.back;
            self.assign_beside(items, start);
        } else {
            self.overwrite_in_place(items);
        }
        debug_assert!(self.invariants_ok());
    }

    /// Replaces the contents with the items of `iter`, reusing the buffer.
    /// If the iterator panics the devector keeps the items taken so far.
    pub fn assign<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.clear();
        self.extend(iter);
    }

    /// Checks the index invariants `front <= back <= capacity` and
    /// `capacity >= N`.
    #[must_use]
    pub fn invariants_ok(&self) -> bool {
        self.front <= self.back && self.back <= self.capacity && self.capacity >= N
    }

    #[inline]
    pub(crate) fn buffer_ptr(&self) -> *const T {
        if self.is_inline() {
            self.inline.as_ptr().cast::<T>()
        } else {
            self.heap.as_ptr()
        }
    }

    #[inline]
    pub(crate) fn buffer_mut_ptr(&mut self) -> *mut T {
        if self.is_inline() {
            self.inline.as_mut_ptr().cast::<T>()
        } else {
            self.heap.as_ptr()
        }
    }

    pub(crate) fn max_size_bound() -> usize {
        cmp::min(G::MAX_CAPACITY, raw::max_elements::<T>())
    }

    pub(crate) fn length_exceeded(requested: usize) -> Error {
        Error::LengthExceeded {
            requested,
            max: Self::max_size_bound(),
        }
    }

    pub(crate) fn sum(a: usize, b: usize) -> Result<usize, Error> {
        a.checked_add(b)
            .ok_or_else(|| Self::length_exceeded(usize::MAX))
    }

    pub(crate) fn checked_capacity(requested: usize) -> Result<usize, Error> {
        if requested > Self::max_size_bound() {
            Err(Self::length_exceeded(requested))
        } else {
            Ok(requested)
        }
    }

    /// Capacity for a buffer that must hold at least `requested` slots:
    /// the policy's suggestion clamped to the maximum, but never less than
    /// `requested`.
    fn calculate_new_capacity(&self, requested: usize) -> Result<usize, Error> {
        let max = Self::max_size_bound();
        if requested > max {
            return Err(Self::length_exceeded(requested));
        }
        let suggested = cmp::min(G::new_capacity(self.capacity), max);
        Ok(cmp::max(requested, suggested))
    }

    fn release_heap(&mut self) {
        if !self.is_inline() {
            unsafe { raw::deallocate(&self.alloc, self.heap, self.capacity) };
        }
    }

    fn adopt_buffer(&mut self, buffer: NonNull<T>, capacity: usize) {
        debug_assert!(capacity > N);
        self.release_heap();
        self.heap = buffer;
        self.capacity = capacity;
    }

    /// Moves the elements into a new heap buffer of `new_capacity` slots,
    /// the first one landing at `new_front`.
    pub(crate) fn reallocate_at(&mut self, new_capacity: usize, new_front: usize) -> Result<(), Error> {
        let len = self.len();
        debug_assert!(new_front + len <= new_capacity);
        let new_buffer = raw::allocate::<T, A>(&self.alloc, new_capacity)?;
        unsafe {
            ptr::copy_nonoverlapping(
                self.buffer_ptr().add(self.front),
                new_buffer.as_ptr().add(new_front),
                len,
            );
        }
        self.adopt_buffer(new_buffer, new_capacity);
        self.front = new_front;
        self.back = new_front + len;
        Ok(())
    }

    /// Grows the buffer by the policy and constructs `f()` at logical
    /// position `index` of the new buffer, the old elements split around it.
    fn emplace_reallocating<F: FnOnce() -> T>(
        &mut self,
        make_front_free: bool,
        index: usize,
        f: F,
    ) -> Result<(), Error> {
        let len = self.len();
        let new_capacity = self.calculate_new_capacity(Self::sum(self.capacity, 1)?)?;
        let new_front = if make_front_free {
            new_capacity - self.back_free_capacity() - len - 1
        } else {
            self.front
        };

        let new_buffer = raw::allocate::<T, A>(&self.alloc, new_capacity)?;
        let alloc_guard = AllocationGuard::new(new_buffer, new_capacity, &self.alloc);
        let dst = alloc_guard.as_ptr();
        unsafe {
            dst.add(new_front + index).write(f());
            let src = self.buffer_ptr().add(self.front);
            ptr::copy_nonoverlapping(src, dst.add(new_front), index);
            ptr::copy_nonoverlapping(src.add(index), dst.add(new_front + index + 1), len - index);
        }
        alloc_guard.release();

        self.adopt_buffer(new_buffer, new_capacity);
        self.front = new_front;
        self.back = new_front + len + 1;
        Ok(())
    }

    /// Inserts `count` elements at `index`; `make(i)` produces the `i`-th.
    /// `make` is called in increasing `i` and only after every fallible
    /// step has succeeded.
    fn insert_with<F: FnMut(usize) -> T>(
        &mut self,
        index: usize,
        count: usize,
        mut make: F,
    ) -> Result<(), Error> {
        if count == 0 {
            return Ok(());
        }
        let len = self.len();
        let front_free = self.front;
        let back_free = self.back_free_capacity();

        if index == len && back_free >= count {
            let mut guard = ConstructionGuard::new(unsafe { self.buffer_mut_ptr().add(self.back) });
            for i in 0..count {
                unsafe { guard.construct(make(i)) };
            }
            self.back += guard.commit();
        } else if index == 0 && front_free >= count {
            let start = self.front - count;
            let mut guard = ConstructionGuard::new(unsafe { self.buffer_mut_ptr().add(start) });
            for i in 0..count {
                unsafe { guard.construct(make(i)) };
            }
            guard.commit();
            self.front = start;
        } else if count - cmp::min(front_free, count) <= back_free {
            let near_front = cmp::min(front_free, count);
            let near_back = count - near_front;
            let old_front = self.front;
            let old_back = self.back;
            let new_front = old_front - near_front;
            let new_back = old_back + near_back;
            let p = self.buffer_mut_ptr();

            let mut front_guard = ConstructionGuard::new(unsafe { p.add(new_front) });
            for i in 0..near_front {
                unsafe { front_guard.construct(make(i)) };
            }
            let mut back_guard = ConstructionGuard::new(unsafe { p.add(old_back) });
            for i in near_front..count {
                unsafe { back_guard.construct(make(i)) };
            }
            back_guard.commit();
            front_guard.commit();

            // [head-items][old..index][old index..][tail-items] -> [old..index][items][old index..]
            unsafe {
                slice::from_raw_parts_mut(p.add(new_front), near_front + index).rotate_left(near_front);
                let tail = old_front + index;
                slice::from_raw_parts_mut(p.add(tail), new_back - tail).rotate_right(near_back);
            }
            self.front = new_front;
            self.back = new_back;
        } else {
            self.insert_reallocating(index, count, make)?;
        }
        Ok(())
    }

    fn insert_reallocating<F: FnMut(usize) -> T>(
        &mut self,
        index: usize,
        count: usize,
        mut make: F,
    ) -> Result<(), Error> {
        let len = self.len();
        let new_capacity = self.calculate_new_capacity(Self::sum(self.capacity, count)?)?;
        let new_front = if index <= len - index {
            new_capacity - self.back_free_capacity() - len - count
        } else {
            self.front
        };

        let new_buffer = raw::allocate::<T, A>(&self.alloc, new_capacity)?;
        let alloc_guard = AllocationGuard::new(new_buffer, new_capacity, &self.alloc);
        let dst = alloc_guard.as_ptr();
        let mut guard = ConstructionGuard::new(unsafe { dst.add(new_front + index) });
        for i in 0..count {
            unsafe { guard.construct(make(i)) };
        }
        unsafe {
            let src = self.buffer_ptr().add(self.front);
            ptr::copy_nonoverlapping(src, dst.add(new_front), index);
            ptr::copy_nonoverlapping(src.add(index), dst.add(new_front + index + count), len - index);
        }
        guard.commit();
        alloc_guard.release();

        self.adopt_buffer(new_buffer, new_capacity);
        self.front = new_front;
        self.back = new_front + len + count;
        Ok(())
    }

    fn grow_back_with<F: FnMut() -> T>(&mut self, new_len: usize, mut f: F) -> Result<(), Error> {
        let len = self.len();
        let added = new_len - len;
        if new_len <= self.capacity - self.front {
            let mut guard = ConstructionGuard::new(unsafe { self.buffer_mut_ptr().add(self.back) });
            for _ in 0..added {
                unsafe { guard.construct(f()) };
            }
            self.back += guard.commit();
            return Ok(());
        }

        let new_capacity = self.calculate_new_capacity(Self::sum(new_len, self.front)?)?;
        let new_buffer = raw::allocate::<T, A>(&self.alloc, new_capacity)?;
        let alloc_guard = AllocationGuard::new(new_buffer, new_capacity, &self.alloc);
        let dst = alloc_guard.as_ptr();
        let mut guard = ConstructionGuard::new(unsafe { dst.add(self.back) });
        for _ in 0..added {
            unsafe { guard.construct(f()) };
        }
        unsafe { ptr::copy_nonoverlapping(self.buffer_ptr().add(self.front), dst.add(self.front), len) };
        guard.commit();
        alloc_guard.release();

        self.adopt_buffer(new_buffer, new_capacity);
        self.back += added;
        Ok(())
    }

    fn grow_front_with<F: FnMut() -> T>(&mut self, new_len: usize, mut f: F) -> Result<(), Error> {
        let len = self.len();
        let added = new_len - len;
        if new_len <= self.back {
            let start = self.front - added;
            let mut guard = ConstructionGuard::new(unsafe { self.buffer_mut_ptr().add(start) });
            for _ in 0..added {
                unsafe { guard.construct(f()) };
            }
            guard.commit();
            self.front = start;
            return Ok(());
        }

        let back_free = self.back_free_capacity();
        let new_capacity = self.calculate_new_capacity(Self::sum(new_len, back_free)?)?;
        let old_elements_at = new_capacity - back_free - len;
        let new_front = old_elements_at - added;

        let new_buffer = raw::allocate::<T, A>(&self.alloc, new_capacity)?;
        let alloc_guard = AllocationGuard::new(new_buffer, new_capacity, &self.alloc);
        let dst = alloc_guard.as_ptr();
        let mut guard = ConstructionGuard::new(unsafe { dst.add(new_front) });
        for _ in 0..added {
            unsafe { guard.construct(f()) };
        }
        unsafe {
            ptr::copy_nonoverlapping(self.buffer_ptr().add(self.front), dst.add(old_elements_at), len);
        }
        guard.commit();
        alloc_guard.release();

        self.adopt_buffer(new_buffer, new_capacity);
        self.front = new_front;
        self.back = old_elements_at + len;
        Ok(())
    }

    fn assign_reallocating(&mut self, items: &[T]) -> Result<(), Error>
    where
        T: Clone,
    {
        let capacity = Self::checked_capacity(items.len())?;
        let new_buffer = raw::allocate::<T, A>(&self.alloc, capacity)?;
        let alloc_guard = AllocationGuard::new(new_buffer, capacity, &self.alloc);
        unsafe { guards::clone_into(items, alloc_guard.as_ptr()) };
        alloc_guard.release();

        self.clear();
        self.adopt_buffer(new_buffer, capacity);
        self.front = 0;
        self.back = items.len();
        Ok(())
    }

    /// Builds clones of `items` at raw slots starting at `start`, then drops
    /// the old elements.
    fn assign_beside(&mut self, items: &[T], start: usize)
    where
        T: Clone,
    {
        let (front, len) = (self.front, self.len());
        let p = self.buffer_mut_ptr();
        let mut guard = unsafe { NandGuard::new(p.add(front), len, p.add(start)) };
        unsafe { guards::clone_into_with(items, guard.dst(), &mut guard) };
        self.front = start;
        self.back = start + items.len();
        guard.release();
    }

    fn overwrite_in_place(&mut self, items: &[T])
    where
        T: Clone,
    {
        let (front, back) = (self.front, self.back);
        let n = items.len();
        let p = self.buffer_mut_ptr();

        let in_front = cmp::min(front, n);
        let mut front_guard = ConstructionGuard::new(p);
        for item in &items[..in_front] {
            unsafe { front_guard.construct(item.clone()) };
        }

        let assigned = cmp::min(back - front, n - in_front);
        for (i, item) in items[in_front..in_front + assigned].iter().enumerate() {
            unsafe { (*p.add(front + i)).clone_from(item) };
        }

        let mut back_guard = ConstructionGuard::new(unsafe { p.add(back) });
        for item in &items[in_front + assigned..] {
            unsafe { back_guard.construct(item.clone()) };
        }
        back_guard.commit();
        front_guard.commit();

        let stale = front + assigned;
        self.front = 0;
        self.back = n;
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(p.add(stale), back - stale)) };
    }

    fn move_inline_into(small: &mut Self, big: &mut Self) {
        let (front, len) = (small.front, small.len());
        unsafe {
            ptr::copy_nonoverlapping(
                small.inline.as_ptr().cast::<T>().add(front),
                big.inline.as_mut_ptr().cast::<T>().add(front),
                len,
            );
        }
    }

    fn check_insert_index(&self, index: usize) {
        let len = self.len();
        assert!(
            index <= len,
            "insertion index (is {index}) should be <= len (is {len})"
        );
    }

    /// Marks every element as moved out without dropping it.
    pub(crate) fn forget_elements(&mut self) {
        self.back = self.front;
    }
}

/// Resolves `range` against a sequence of length `len`.
pub(crate) fn bounds<R: RangeBounds<usize>>(range: R, len: usize) -> (usize, usize) {
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

/// Exchanges the contents of `a` and `b`; see [`Devector::swap`].
pub fn swap<T, const N: usize, G: GrowthPolicy, A: Allocator>(
    a: &mut Devector<T, N, G, A>,
    b: &mut Devector<T, N, G, A>,
) {
    a.swap(b);
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> Drop for Devector<T, N, G, A> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(self.as_mut_slice()) };
        self.release_heap();
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator + Default> Default for Devector<T, N, G, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, const N: usize, G: GrowthPolicy, A: Allocator + Clone> Clone for Devector<T, N, G, A> {
    fn clone(&self) -> Self {
        Self::from_slice_in(self.as_slice(), self.alloc.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign_from_slice(source.as_slice());
    }
}

impl<T: fmt::Debug, const N: usize, G: GrowthPolicy, A: Allocator> fmt::Debug
    for Devector<T, N, G, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> Deref for Devector<T, N, G, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> DerefMut for Devector<T, N, G, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> AsRef<[T]> for Devector<T, N, G, A> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> AsMut<[T]> for Devector<T, N, G, A> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> Borrow<[T]> for Devector<T, N, G, A> {
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> BorrowMut<[T]> for Devector<T, N, G, A> {
    fn borrow_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone, const N: usize, G: GrowthPolicy, A: Allocator + Default> From<&[T]>
    for Devector<T, N, G, A>
{
    fn from(items: &[T]) -> Self {
        Self::from_slice_in(items, A::default())
    }
}
