//! Operations that skip capacity checks or element construction.
//!
//! They exist for hot loops that have already reserved room, and for
//! filling raw slots directly (for example from a `read` call) before
//! exposing them as elements. Every `unsafe fn` here states what the caller
//! must guarantee.

use core::mem::MaybeUninit;
use core::slice;

use allocator_api2::alloc::{Allocator, Global};

use crate::devector::Devector;
use crate::error::infallible;
use crate::policy::GrowthPolicy;

impl<T, const N: usize, G: GrowthPolicy> Devector<T, N, G, Global> {
    /// Creates a devector whose first `len` slots are exposed as elements
    /// without being initialized.
    ///
    /// # Safety
    ///
    /// Every element must be written (for example through
    /// [`as_mut_ptr`](Devector::as_mut_ptr)) before it is read or dropped.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`max_size`](Devector::max_size).
    #[must_use]
    pub unsafe fn with_uninitialized_len(len: usize) -> Self {
        unsafe { Self::with_uninitialized_len_in(len, Global) }
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> Devector<T, N, G, A> {
    /// See [`with_uninitialized_len`](Devector::with_uninitialized_len).
    ///
    /// # Safety
    ///
    /// Every element must be written before it is read or dropped.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`max_size`](Devector::max_size).
    #[must_use]
    pub unsafe fn with_uninitialized_len_in(len: usize, alloc: A) -> Self {
        let mut dv = Self::with_capacity_in(len, alloc);
        dv.back = len;
        dv
    }

    /// Writes `value` into the free slot before the first element.
    ///
    /// # Safety
    ///
    /// [`front_free_capacity`](Devector::front_free_capacity) must be non-zero.
    pub unsafe fn push_front_unchecked(&mut self, value: T) {
        debug_assert!(self.front > 0, "push_front_unchecked without front capacity");
        let slot = self.front - 1;
        unsafe { self.buffer_mut_ptr().add(slot).write(value) };
        self.front = slot;
    }

    /// Writes `value` into the free slot after the last element.
    ///
    /// # Safety
    ///
    /// [`back_free_capacity`](Devector::back_free_capacity) must be non-zero.
    pub unsafe fn push_back_unchecked(&mut self, value: T) {
        debug_assert!(self.back < self.capacity, "push_back_unchecked without back capacity");
        let slot = self.back;
        unsafe { self.buffer_mut_ptr().add(slot).write(value) };
        self.back = slot + 1;
    }

    /// Moves the front boundary so that `len() == new_len`, without
    /// constructing or dropping anything. Reallocates when the front lacks
    /// room, keeping the back's free slots.
    ///
    /// # Safety
    ///
    /// When growing, the exposed slots `[0, new_len - len())` hold no value
    /// and must be written before they are read or dropped. When shrinking,
    /// the hidden elements are forgotten; the caller must have moved them
    /// out or accept the leak.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity exceeds [`max_size`](Devector::max_size).
    pub unsafe fn resize_front_uninit(&mut self, new_len: usize) {
        let len = self.len();
        if new_len <= len {
            self.front += len - new_len;
            return;
        }
        let added = new_len - len;
        if added > self.front {
            let back_free = self.back_free_capacity();
            let total = infallible(Self::sum(new_len, back_free).and_then(Self::checked_capacity));
            infallible(self.reallocate_at(total, added));
        }
        self.front -= added;
        debug_assert!(self.invariants_ok());
    }

    /// Moves the back boundary so that `len() == new_len`, without
    /// constructing or dropping anything.
    ///
    /// # Safety
    ///
    /// When growing, the exposed slots `[len(), new_len)` must be written
    /// before they are read or dropped. When shrinking, the hidden elements
    /// are forgotten.
    ///
    /// # Panics
    ///
    /// Panics if the required capacity exceeds [`max_size`](Devector::max_size).
    pub unsafe fn resize_back_uninit(&mut self, new_len: usize) {
        let len = self.len();
        if new_len <= len {
            self.back -= len - new_len;
            return;
        }
        let added = new_len - len;
        if added > self.back_free_capacity() {
            let front = self.front;
            let total = infallible(Self::sum(new_len, front).and_then(Self::checked_capacity));
            infallible(self.reallocate_at(total, front));
        }
        self.back += added;
        debug_assert!(self.invariants_ok());
    }

    /// The raw slots before the first element.
    ///
    /// Fill the tail of this slice, then expose it with
    /// [`resize_front_uninit`](Devector::resize_front_uninit).
    pub fn spare_front_capacity_mut(&mut self) -> &mut [MaybeUninit<T>] {
        let front = self.front;
        let p = self.buffer_mut_ptr().cast::<MaybeUninit<T>>();
        unsafe { slice::from_raw_parts_mut(p, front) }
    }

    /// The raw slots after the last element.
    ///
    /// Fill the head of this slice, then expose it with
    /// [`resize_back_uninit`](Devector::resize_back_uninit).
    pub fn spare_back_capacity_mut(&mut self) -> &mut [MaybeUninit<T>] {
        let (back, spare) = (self.back, self.back_free_capacity());
        let p = self.buffer_mut_ptr().cast::<MaybeUninit<T>>();
        unsafe { slice::from_raw_parts_mut(p.add(back), spare) }
    }
}
