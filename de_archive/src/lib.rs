#![no_std]

//! Save and load `Devector` and `BatchDeque` over `embedded_io` streams.
//!
//! The format is the element count as a little-endian `u64`, followed by
//! the elements in order. Elements encode themselves through [`Element`];
//! numbers are stored in native byte order and are moved in bulk, one
//! `write_all` / `read_exact` per buffer or segment.
//!
//! Loading reuses the destination: it is resized to the archived length,
//! growing into its free front capacity first and its free back capacity
//! second, and the elements are then read in place.
//!
//! ```
//! use batch_deque::BatchDeque;
//! use de_archive::Archive;
//! use devector::Devector;
//!
//! let source: BatchDeque<u32, 4> = (0..10).collect();
//! let mut bytes = Vec::new();
//! source.save(&mut bytes).unwrap();
//!
//! let mut target: Devector<u32> = Devector::new();
//! target.load(&mut bytes.as_slice()).unwrap();
//! assert_eq!(target, (0..10).collect::<Vec<_>>());
//! ```
//!
//! The archived count is checked against the container's `max_size`, but
//! storage beyond the current capacity is added in bounded steps, each one
//! read before the next is allocated. A corrupt count with a short body
//! fails with `UnexpectedEof` instead of a huge allocation.
//!
//! If loading fails, the container holds at most the archived number of
//! elements and its content is unspecified; it is always safe to drop or
//! reuse.

extern crate alloc;

mod deque;
mod element;
mod error;
mod stream;
mod vector;

use embedded_io::{Read, Write};

pub use element::Element;
pub use error::{ArchiveError, Result};

/// A container that can be written to and rebuilt from a byte stream.
pub trait Archive {
    /// Writes the element count and the elements.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Io` if the writer fails.
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), W::Error>;

    /// Replaces the content with the archived elements.
    ///
    /// # Errors
    ///
    /// - `ArchiveError::UnexpectedEof` if the input is truncated
    /// - `ArchiveError::InvalidData` if an element is malformed
    /// - `ArchiveError::Container` if the count exceeds the container's `max_size`
    /// - `ArchiveError::Io` if the reader fails
    fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), R::Error>;
}

/// Loads a new container from `reader`.
///
/// # Errors
///
/// Same as [`Archive::load`].
pub fn from_reader<C, R>(reader: &mut R) -> Result<C, R::Error>
where
    C: Archive + Default,
    R: Read,
{
    let mut container = C::default();
    container.load(reader)?;
    Ok(container)
}
