#![allow(dead_code)]

use embedded_io::{Read, Write};

/// Hands out at most one byte per `read` call.
pub struct OneByteReader<I>
where
    I: Iterator<Item = u8>,
{
    iter: I,
}

impl<I> OneByteReader<I>
where
    I: Iterator<Item = u8>,
{
    pub fn new(iter: I) -> Self {
        OneByteReader { iter }
    }
}

impl<I> embedded_io::ErrorType for OneByteReader<I>
where
    I: Iterator<Item = u8>,
{
    type Error = embedded_io::ErrorKind;
}

impl<I> Read for OneByteReader<I>
where
    I: Iterator<Item = u8>,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.iter.next() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

/// Accepts `capacity` bytes, then fails every write.
pub struct LimitedWriter {
    pub written: Vec<u8>,
    capacity: usize,
}

impl LimitedWriter {
    pub fn new(capacity: usize) -> Self {
        LimitedWriter {
            written: Vec::new(),
            capacity,
        }
    }
}

impl embedded_io::ErrorType for LimitedWriter {
    type Error = embedded_io::ErrorKind;
}

impl Write for LimitedWriter {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let room = self.capacity - self.written.len();
        if room == 0 && !buf.is_empty() {
            return Err(embedded_io::ErrorKind::Other);
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
