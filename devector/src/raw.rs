//! Raw storage primitives shared by the containers.
//!
//! Storage moves through three states: unallocated, allocated but raw, and
//! holding live elements. This module owns the first transition pair
//! (allocate / deallocate); [`crate::guards`] owns the rollback of the second.

use core::alloc::Layout;
use core::mem;
use core::ptr::NonNull;

use allocator_api2::alloc::Allocator;

use crate::error::Error;

/// Largest number of `T` a single allocation may hold.
#[must_use]
pub const fn max_elements<T>() -> usize {
    let size = mem::size_of::<T>();
    if size == 0 {
        usize::MAX
    } else {
        isize::MAX as usize / size
    }
}

/// Layout of an array of `capacity` elements.
///
/// # Errors
///
/// Returns `Error::LengthExceeded` if the array would not fit in `isize::MAX` bytes.
pub fn array_layout<T>(capacity: usize) -> Result<Layout, Error> {
    Layout::array::<T>(capacity).map_err(|_| Error::LengthExceeded {
        requested: capacity,
        max: max_elements::<T>(),
    })
}

/// Allocates raw storage for `capacity` elements of `T`.
///
/// Zero-sized requests return a dangling, well-aligned pointer without
/// touching the allocator.
///
/// # Errors
///
/// Returns `Error::LengthExceeded` for an unrepresentable layout and
/// `Error::AllocFailed` if the allocator refuses.
pub fn allocate<T, A: Allocator>(alloc: &A, capacity: usize) -> Result<NonNull<T>, Error> {
    let layout = array_layout::<T>(capacity)?;
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    alloc
        .allocate(layout)
        .map(|block| block.cast::<T>())
        .map_err(|_| Error::AllocFailed { layout })
}

/// Returns storage obtained from [`allocate`].
///
/// # Safety
///
/// `ptr` must have been returned by [`allocate`] with an allocator equivalent
/// to `alloc` and the same `capacity`, and must not be used afterwards.
pub unsafe fn deallocate<T, A: Allocator>(alloc: &A, ptr: NonNull<T>, capacity: usize) {
    if let Ok(layout) = Layout::array::<T>(capacity) {
        if layout.size() != 0 {
            unsafe { alloc.deallocate(ptr.cast::<u8>(), layout) };
        }
    }
}
