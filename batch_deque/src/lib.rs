#![no_std]

//! `BatchDeque`: a segmented double-ended queue.
//!
//! Elements are stored in fixed-size heap segments; a `Devector` of segment
//! pointers keeps the segments in order. Growing at either end allocates a
//! segment and never relocates an element, so references into the deque
//! survive pushes at both ends.
//!
//! [`BatchDeque::stable_insert`] goes further: it inserts a batch of values
//! in the middle by splicing freshly filled segments into the map, which
//! keeps every existing element at its address.
//!
//! ```
//! use batch_deque::BatchDeque;
//!
//! let mut dq: BatchDeque<u32, 4> = (0..8).collect();
//! let four = &dq[4] as *const u32;
//! let at = dq.stable_insert(5, [100, 101]);
//! assert_eq!(at, 4);
//! assert_eq!(dq, [0, 1, 2, 3, 100, 101, 0, 0, 4, 5, 6, 7]);
//! assert_eq!(&dq[8] as *const u32, four);
//! ```
//!
//! Segments are the unit of bulk access: [`BatchDeque::segments`] yields
//! each live run as a slice.
//!
//! ## `no_std` Compatibility
//!
//! Only `core` and `alloc` are required. The `std` feature forwards to
//! `devector/std`.

extern crate alloc;

mod cmp;
mod deque;
mod iter;
mod position;

pub use crate::deque::{swap, BatchDeque};
pub use allocator_api2;
pub use devector::Error;
pub use iter::{IntoIter, Iter, IterMut, Segments, SegmentsMut};
