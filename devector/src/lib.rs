#![no_std]

//! `Devector`: a contiguous sequence with independent free capacity at both ends.
//!
//! A devector keeps its elements in one buffer, between a front index and a
//! back index. Pushing at the front uses the free slots before the first
//! element, pushing at the back uses the free slots after the last one, so
//! both ends are amortized O(1) while the elements stay a plain slice.
//!
//! The first `N` slots live inside the devector itself. Up to `N` elements
//! never touch the heap, and `shrink_to_fit` moves the elements back inline
//! once they fit again.
//!
//! # Type parameters
//!
//! - `T`: element type.
//! - `N`: inline buffer size, `0` by default (no inline storage).
//! - `G`: a [`GrowthPolicy`], [`DefaultGrowthPolicy`] by default.
//! - `A`: an [`Allocator`](allocator_api2::alloc::Allocator), `Global` by default.
//!
//! ```
//! use devector::Devector;
//!
//! let mut dv: Devector<u32> = Devector::with_capacity_front_back(2, 2);
//! dv.push_front(2);
//! dv.push_front(1);
//! dv.push_back(3);
//! assert_eq!(dv, [1, 2, 3]);
//! assert_eq!(dv.front_free_capacity(), 0);
//! assert_eq!(dv.back_free_capacity(), 1);
//! ```
//!
//! # Panics and failure
//!
//! The growing operations panic on capacity overflow and call
//! `handle_alloc_error` when the allocator fails, like the standard
//! collections; `try_reserve_front` / `try_reserve_back` report both as
//! [`Error`]. A panic raised by `Clone`, `Default`, a caller closure or an
//! iterator leaves the devector unchanged unless the method documents
//! otherwise. Element destructors must not panic; if one does, elements
//! are leaked, never dropped twice.
//!
//! # Unchecked operations
//!
//! `push_front_unchecked`, `push_back_unchecked`, `resize_front_uninit`,
//! `resize_back_uninit` and `with_uninitialized_len` skip capacity checks
//! or element construction. They are `unsafe fn`s and document what the
//! caller has to uphold.
//!
//! ## `no_std` Compatibility
//!
//! The crate only needs `core` and `alloc`. Enable the `std` feature to get
//! `std::error::Error` support through `thiserror`:
//! ```toml
//! [dependencies]
//! devector = { version = "0.1", features = ["std"] }
//! ```

extern crate alloc;

mod cmp;
mod devector;
mod error;
pub mod guards;
mod iter;
mod policy;
pub mod raw;
mod unchecked;

// Re-export public types and traits
pub use crate::devector::{swap, Devector};
pub use allocator_api2;
pub use error::{infallible, Error};
pub use iter::IntoIter;
pub use policy::{DefaultGrowthPolicy, GrowthPolicy};
