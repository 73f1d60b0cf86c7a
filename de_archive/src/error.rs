use embedded_io::ReadExactError;
use thiserror::Error;

/// Error type for saving and loading archives.
///
/// `E` is the error type of the underlying stream.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ArchiveError<E> {
    /// The stream reported an error
    #[error("I/O error: {0:?}")]
    Io(E),
    /// The stream ended before the archive was complete
    #[error("Unexpected end of input")]
    UnexpectedEof,
    /// The bytes do not encode a value of the expected type
    #[error("Invalid data: {reason}")]
    InvalidData {
        /// What was wrong with the input
        reason: &'static str,
    },
    /// The container cannot hold the archived number of elements
    #[error(transparent)]
    Container(#[from] devector::Error),
}

impl<E> From<ReadExactError<E>> for ArchiveError<E> {
    fn from(error: ReadExactError<E>) -> Self {
        match error {
            ReadExactError::UnexpectedEof => ArchiveError::UnexpectedEof,
            ReadExactError::Other(e) => ArchiveError::Io(e),
        }
    }
}

pub type Result<T, E> = core::result::Result<T, ArchiveError<E>>;
