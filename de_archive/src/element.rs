//! Per-element encoding.

use alloc::string::String;
use alloc::vec::Vec;
use core::{mem, slice};

use embedded_io::{Read, Write};

use crate::error::{ArchiveError, Result};
use crate::stream::{next_step, read_size, write_size};

/// A value that can be written to and read back from a byte stream.
///
/// Types whose in-memory representation is their encoding also expose it
/// through [`as_bytes`](Element::as_bytes) and
/// [`as_bytes_mut`](Element::as_bytes_mut); containers then move whole
/// runs of elements with one `write_all` or `read_exact` call.
pub trait Element: Sized {
    /// Writes one value.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Io` if the writer fails.
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), W::Error>;

    /// Reads one value.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::UnexpectedEof` on truncated input,
    /// `ArchiveError::InvalidData` on malformed input and `ArchiveError::Io`
    /// if the reader fails.
    fn load<R: Read>(reader: &mut R) -> Result<Self, R::Error>;

    /// Reads one value over `self`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Element::load).
    fn load_into<R: Read>(&mut self, reader: &mut R) -> Result<(), R::Error> {
        *self = Self::load(reader)?;
        Ok(())
    }

    /// The encoding of `items`, if it is their memory.
    fn as_bytes(_items: &[Self]) -> Option<&[u8]> {
        None
    }

    /// Writable view of the memory of `items`, if any byte pattern is a
    /// valid encoding.
    fn as_bytes_mut(_items: &mut [Self]) -> Option<&mut [u8]> {
        None
    }
}

/// Writes `items`, in one call when the element type allows it.
pub(crate) fn save_run<T: Element, W: Write>(items: &[T], writer: &mut W) -> Result<(), W::Error> {
    if let Some(bytes) = T::as_bytes(items) {
        return writer.write_all(bytes).map_err(ArchiveError::Io);
    }
    for item in items {
        item.save(writer)?;
    }
    Ok(())
}

/// Reads over `items`, in one call when the element type allows it.
pub(crate) fn load_run<T: Element, R: Read>(items: &mut [T], reader: &mut R) -> Result<(), R::Error> {
    if let Some(bytes) = T::as_bytes_mut(items) {
        return Ok(reader.read_exact(bytes)?);
    }
    for item in items {
        item.load_into(reader)?;
    }
    Ok(())
}

// Fixed-width numbers: native byte order, no padding, every bit pattern valid.
macro_rules! impl_element_for_number {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                fn save<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
                    writer.write_all(&self.to_ne_bytes()).map_err(ArchiveError::Io)
                }

                fn load<R: Read>(reader: &mut R) -> Result<Self, R::Error> {
                    let mut bytes = [0u8; mem::size_of::<$t>()];
                    reader.read_exact(&mut bytes)?;
                    Ok(<$t>::from_ne_bytes(bytes))
                }

                fn as_bytes(items: &[Self]) -> Option<&[u8]> {
                    let len = mem::size_of_val(items);
                    Some(unsafe { slice::from_raw_parts(items.as_ptr().cast::<u8>(), len) })
                }

                fn as_bytes_mut(items: &mut [Self]) -> Option<&mut [u8]> {
                    let len = mem::size_of_val(items);
                    Some(unsafe { slice::from_raw_parts_mut(items.as_mut_ptr().cast::<u8>(), len) })
                }
            }
        )*
    };
}

impl_element_for_number!(u8, i8, u16, i16, u32, i32, u64, i64, u128, i128, f32, f64);

impl Element for bool {
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        writer.write_all(&[u8::from(*self)]).map_err(ArchiveError::Io)
    }

    fn load<R: Read>(reader: &mut R) -> Result<Self, R::Error> {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        match byte[0] {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ArchiveError::InvalidData {
                reason: "bool byte is neither 0 nor 1",
            }),
        }
    }

    fn as_bytes(items: &[Self]) -> Option<&[u8]> {
        Some(unsafe { slice::from_raw_parts(items.as_ptr().cast::<u8>(), items.len()) })
    }
}

/// Length-prefixed UTF-8.
impl Element for String {
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        write_size(writer, self.len())?;
        writer.write_all(self.as_bytes()).map_err(ArchiveError::Io)
    }

    fn load<R: Read>(reader: &mut R) -> Result<Self, R::Error> {
        let len = read_size(reader, usize::MAX)?;
        let mut bytes = Vec::new();
        while bytes.len() < len {
            let start = bytes.len();
            bytes.resize(start + next_step(start, len), 0);
            reader.read_exact(&mut bytes[start..])?;
        }
        String::from_utf8(bytes).map_err(|_| ArchiveError::InvalidData {
            reason: "string is not valid UTF-8",
        })
    }
}
