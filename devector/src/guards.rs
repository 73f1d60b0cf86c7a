//! Scoped rollback primitives.
//!
//! Each guard protects one step of a multi-step operation. Dropping a guard
//! without calling `release` undoes exactly what the guard recorded, which is
//! what happens when a clone, a default constructor or a caller closure
//! panics halfway through.

use core::mem;
use core::ptr::{self, NonNull};

use allocator_api2::alloc::Allocator;

use crate::raw;

/// Common surface of the element-tracking guards.
pub trait Guard<T> {
    /// Records one more element constructed at the end of the tracked run.
    fn extend(&mut self);

    /// Commits the operation; the guard no longer undoes anything.
    fn release(self);
}

/// Deallocates a freshly allocated buffer unless released.
pub struct AllocationGuard<'a, T, A: Allocator> {
    ptr: NonNull<T>,
    capacity: usize,
    alloc: &'a A,
}

impl<'a, T, A: Allocator> AllocationGuard<'a, T, A> {
    /// Takes ownership of `ptr`, which must come from
    /// [`raw::allocate`] with `alloc` and `capacity`.
    pub fn new(ptr: NonNull<T>, capacity: usize, alloc: &'a A) -> Self {
        Self {
            ptr,
            capacity,
            alloc,
        }
    }

    #[must_use]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Hands the buffer over to the caller.
    pub fn release(self) -> NonNull<T> {
        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl<T, A: Allocator> Drop for AllocationGuard<'_, T, A> {
    fn drop(&mut self) {
        unsafe { raw::deallocate(self.alloc, self.ptr, self.capacity) };
    }
}

/// Tracks a contiguous run of constructed elements starting at `start`.
///
/// On drop the first `count` elements are destroyed, nothing more.
pub struct ConstructionGuard<T> {
    start: *mut T,
    count: usize,
}

impl<T> ConstructionGuard<T> {
    #[must_use]
    pub fn new(start: *mut T) -> Self {
        Self { start, count: 0 }
    }

    /// Writes `value` into the next slot of the run and records it.
    ///
    /// # Safety
    ///
    /// `start + count` must be a raw, writable slot of the same allocation.
    pub unsafe fn construct(&mut self, value: T) {
        unsafe { self.start.add(self.count).write(value) };
        self.count += 1;
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Commits the run and returns its length.
    pub fn commit(self) -> usize {
        let count = self.count;
        mem::forget(self);
        count
    }
}

impl<T> Guard<T> for ConstructionGuard<T> {
    fn extend(&mut self) {
        self.count += 1;
    }

    fn release(self) {
        mem::forget(self);
    }
}

impl<T> Drop for ConstructionGuard<T> {
    fn drop(&mut self) {
        if mem::needs_drop::<T>() {
            unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.count)) };
        }
    }
}

/// Pairs an existing run with the replacement run being built for it.
///
/// Released: the old run is destroyed and the replacement kept.
/// Dropped early: the partial replacement is destroyed and the old run is
/// left untouched. Exactly one of the two survives.
pub struct NandGuard<T> {
    src: *mut T,
    src_len: usize,
    dst: *mut T,
    dst_len: usize,
}

impl<T> NandGuard<T> {
    /// `src` must point at `src_len` live elements and `dst` at raw slots
    /// that do not overlap them.
    #[must_use]
    pub fn new(src: *mut T, src_len: usize, dst: *mut T) -> Self {
        Self {
            src,
            src_len,
            dst,
            dst_len: 0,
        }
    }

    #[must_use]
    pub fn dst(&self) -> *mut T {
        self.dst
    }
}

impl<T> Guard<T> for NandGuard<T> {
    fn extend(&mut self) {
        self.dst_len += 1;
    }

    fn release(self) {
        let (src, src_len) = (self.src, self.src_len);
        mem::forget(self);
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(src, src_len)) };
    }
}

impl<T> Drop for NandGuard<T> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.dst, self.dst_len)) };
    }
}

/// Guard for element types without drop glue: there is nothing to undo.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGuard;

impl<T> Guard<T> for NullGuard {
    #[inline]
    fn extend(&mut self) {}

    #[inline]
    fn release(self) {}
}

/// Clones `src` into the raw slots at `dst`, reporting each element to `guard`.
///
/// # Safety
///
/// `dst` must have room for `src.len()` raw slots not overlapping `src`.
pub unsafe fn clone_into_with<T: Clone, G: Guard<T>>(src: &[T], dst: *mut T, guard: &mut G) {
    for (i, item) in src.iter().enumerate() {
        unsafe { dst.add(i).write(item.clone()) };
        guard.extend();
    }
}

/// Clones `src` into raw storage at `dst`.
///
/// If a clone panics, the clones made so far are destroyed before the panic
/// continues. Types without drop glue skip the tracking entirely.
///
/// # Safety
///
/// Same as [`clone_into_with`].
pub unsafe fn clone_into<T: Clone>(src: &[T], dst: *mut T) {
    if mem::needs_drop::<T>() {
        let mut guard = ConstructionGuard::new(dst);
        unsafe { clone_into_with(src, dst, &mut guard) };
        Guard::release(guard);
    } else {
        unsafe { clone_into_with(src, dst, &mut NullGuard) };
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use allocator_api2::alloc::Global;
    use core::cell::Cell;
    use core::mem::MaybeUninit;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    struct Probe(Rc<Cell<usize>>);

    impl Drop for Probe {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_construction_guard_drops_exactly_constructed() {
        let drops = Rc::new(Cell::new(0));
        let mut slots: [MaybeUninit<Probe>; 4] = [const { MaybeUninit::uninit() }; 4];
        {
            let mut guard = ConstructionGuard::new(slots.as_mut_ptr().cast::<Probe>());
            unsafe {
                guard.construct(Probe(drops.clone()));
                guard.construct(Probe(drops.clone()));
            }
            assert_eq!(guard.count(), 2);
        }
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_construction_guard_commit_keeps_elements() {
        let drops = Rc::new(Cell::new(0));
        let mut slots: [MaybeUninit<Probe>; 2] = [const { MaybeUninit::uninit() }; 2];
        let ptr = slots.as_mut_ptr().cast::<Probe>();
        let mut guard = ConstructionGuard::new(ptr);
        unsafe { guard.construct(Probe(drops.clone())) };
        assert_eq!(guard.commit(), 1);
        assert_eq!(drops.get(), 0);
        unsafe { ptr::drop_in_place(ptr) };
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_nand_guard_release_drops_source() {
        let old = Rc::new(Cell::new(0));
        let new = Rc::new(Cell::new(0));
        let mut src: [MaybeUninit<Probe>; 2] = [const { MaybeUninit::uninit() }; 2];
        let mut dst: [MaybeUninit<Probe>; 2] = [const { MaybeUninit::uninit() }; 2];
        let src_ptr = src.as_mut_ptr().cast::<Probe>();
        let dst_ptr = dst.as_mut_ptr().cast::<Probe>();
        unsafe {
            src_ptr.write(Probe(old.clone()));
            src_ptr.add(1).write(Probe(old.clone()));
        }
        let mut guard = NandGuard::new(src_ptr, 2, dst_ptr);
        unsafe { guard.dst().write(Probe(new.clone())) };
        guard.extend();
        guard.release();
        assert_eq!(old.get(), 2);
        assert_eq!(new.get(), 0);
        unsafe { ptr::drop_in_place(dst_ptr) };
    }

    #[test]
    fn test_nand_guard_unwind_keeps_source() {
        let old = Rc::new(Cell::new(0));
        let new = Rc::new(Cell::new(0));
        let mut src: [MaybeUninit<Probe>; 1] = [const { MaybeUninit::uninit() }; 1];
        let mut dst: [MaybeUninit<Probe>; 1] = [const { MaybeUninit::uninit() }; 1];
        let src_ptr = src.as_mut_ptr().cast::<Probe>();
        let dst_ptr = dst.as_mut_ptr().cast::<Probe>();
        unsafe { src_ptr.write(Probe(old.clone())) };
        {
            let mut guard = NandGuard::new(src_ptr, 1, dst_ptr);
            unsafe { guard.dst().write(Probe(new.clone())) };
            guard.extend();
        }
        assert_eq!(new.get(), 1);
        assert_eq!(old.get(), 0);
        unsafe { ptr::drop_in_place(src_ptr) };
    }

    #[test]
    fn test_clone_into_cleans_up_on_panic() {
        #[derive(Debug)]
        struct Fussy(u32, Rc<Cell<usize>>);
        impl Clone for Fussy {
            fn clone(&self) -> Self {
                assert!(self.0 != 2, "refusing to clone 2");
                Fussy(self.0, self.1.clone())
            }
        }
        impl Drop for Fussy {
            fn drop(&mut self) {
                self.1.set(self.1.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        let src = std::vec![
            Fussy(0, drops.clone()),
            Fussy(1, drops.clone()),
            Fussy(2, drops.clone()),
        ];
        let mut dst: [MaybeUninit<Fussy>; 3] = [const { MaybeUninit::uninit() }; 3];
        let result = catch_unwind(AssertUnwindSafe(|| unsafe {
            clone_into(&src, dst.as_mut_ptr().cast::<Fussy>());
        }));
        assert!(result.is_err());
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_allocation_guard_frees_unless_released() {
        let ptr = raw::allocate::<u64, _>(&Global, 8).unwrap();
        drop(AllocationGuard::new(ptr, 8, &Global));

        let ptr = raw::allocate::<u64, _>(&Global, 8).unwrap();
        let kept = AllocationGuard::new(ptr, 8, &Global).release();
        unsafe {
            kept.as_ptr().write(7);
            assert_eq!(kept.as_ptr().read(), 7);
            raw::deallocate(&Global, kept, 8);
        }
    }
}
