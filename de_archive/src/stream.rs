use embedded_io::{Read, Write};

use crate::error::{ArchiveError, Result};

/// Largest first step when growing toward an archived count. A count is
/// not trusted until the bytes behind it have been read, so storage grows
/// one step at a time, each step at most the size already loaded.
pub(crate) const LOAD_STEP: usize = 4096;

/// Number of items to add next when `loaded` of `size` items are in.
pub(crate) fn next_step(loaded: usize, size: usize) -> usize {
    (size - loaded).min(loaded.max(LOAD_STEP))
}

/// Writes an element count as a little-endian `u64`.
pub(crate) fn write_size<W: Write>(writer: &mut W, size: usize) -> Result<(), W::Error> {
    writer
        .write_all(&(size as u64).to_le_bytes())
        .map_err(ArchiveError::Io)
}

/// Reads an element count and checks it against `max`.
pub(crate) fn read_size<R: Read>(reader: &mut R, max: usize) -> Result<usize, R::Error> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    let size = u64::from_le_bytes(bytes);
    match usize::try_from(size) {
        Ok(requested) if requested <= max => Ok(requested),
        Ok(requested) => Err(devector::Error::LengthExceeded { requested, max }.into()),
        Err(_) => Err(devector::Error::LengthExceeded {
            requested: usize::MAX,
            max,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_is_little_endian() {
        let mut buffer = [0u8; 8];
        let mut writer: &mut [u8] = &mut buffer;
        write_size(&mut writer, 0x0102).unwrap();
        assert_eq!(buffer, [2, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_read_size_checks_the_maximum() {
        let bytes = 9u64.to_le_bytes();
        let mut reader: &[u8] = &bytes;
        assert_eq!(
            read_size(&mut reader, 8),
            Err(ArchiveError::Container(devector::Error::LengthExceeded {
                requested: 9,
                max: 8
            }))
        );

        let mut reader: &[u8] = &bytes;
        assert_eq!(read_size(&mut reader, 9), Ok(9));

        let mut reader: &[u8] = &bytes[..3];
        assert_eq!(read_size(&mut reader, 9), Err(ArchiveError::UnexpectedEof));
    }

    #[test]
    fn test_steps_double_up_to_the_size() {
        assert_eq!(next_step(0, 10), 10);
        assert_eq!(next_step(0, 1 << 40), LOAD_STEP);
        assert_eq!(next_step(LOAD_STEP, 1 << 40), LOAD_STEP);
        assert_eq!(next_step(3 * LOAD_STEP, 1 << 40), 3 * LOAD_STEP);
        assert_eq!(next_step(3 * LOAD_STEP, 3 * LOAD_STEP + 5), 5);
        assert_eq!(next_step(7, 7), 0);
    }
}
