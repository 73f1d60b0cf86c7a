use core::alloc::Layout;

use alloc::alloc::handle_alloc_error;
use thiserror::Error;

/// Error types for `Devector` and `BatchDeque` operations
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// Checked access with an index that is not below the length
    #[error("Index out of range: index {index} is beyond container length {length}")]
    IndexOutOfRange {
        /// Index that was accessed
        index: usize,
        /// Current length of the container
        length: usize,
    },
    /// A capacity computation overflowed or exceeded the maximum size
    #[error("Length exceeded: requested capacity {requested}, but the maximum is {max}")]
    LengthExceeded {
        /// Requested element count (saturated on arithmetic overflow)
        requested: usize,
        /// Largest element count the container supports
        max: usize,
    },
    /// The allocator refused the request
    #[error("Allocation failed for layout {layout:?}")]
    AllocFailed {
        /// Layout passed to the allocator
        layout: Layout,
    },
}

/// Unwraps the result of a fallible capacity operation the way the standard
/// collections do: allocation failures go to [`handle_alloc_error`], every
/// other error panics with its message.
///
/// # Panics
///
/// Panics if `result` is `Err(Error::LengthExceeded { .. })` or
/// `Err(Error::IndexOutOfRange { .. })`.
#[track_caller]
pub fn infallible<T>(result: Result<T, Error>) -> T {
    match result {
        Ok(value) => value,
        Err(Error::AllocFailed { layout }) => handle_alloc_error(layout),
        Err(error) => panic!("{error}"),
    }
}
