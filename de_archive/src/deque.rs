use batch_deque::allocator_api2::alloc::Allocator;
use batch_deque::BatchDeque;
use embedded_io::{Read, Write};

use crate::element::{load_run, save_run, Element};
use crate::error::Result;
use crate::stream::{next_step, read_size, write_size};
use crate::Archive;

/// Each segment is one run, so byte-viewable element types cost one call
/// per segment.
impl<T, const SEGMENT_SIZE: usize, A> Archive for BatchDeque<T, SEGMENT_SIZE, A>
where
    T: Element + Default,
    A: Allocator,
{
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        write_size(writer, self.len())?;
        for run in self.segments() {
            save_run(run, writer)?;
        }
        Ok(())
    }

    /// Allocated segments are filled first, front then back. Segments for
    /// the rest are added step by step, each step read before the next is
    /// allocated.
    fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), R::Error> {
        let size = read_size(reader, self.max_size())?;
        let front = size.min(self.front_free_capacity() + self.len());
        self.resize_front_with(front, T::default);
        let reused = size.min(self.len() + self.back_free_capacity());
        self.resize_back_with(reused, T::default);
        load_tail(self, 0, reader)?;

        while self.len() < size {
            let start = self.len();
            let step = next_step(start, size);
            self.try_reserve_back(step)?;
            self.resize_back_with(start + step, T::default);
            load_tail(self, start, reader)?;
        }
        Ok(())
    }
}

/// Reads over the elements from index `start` to the end.
fn load_tail<T, const SEGMENT_SIZE: usize, A, R>(
    deque: &mut BatchDeque<T, SEGMENT_SIZE, A>,
    start: usize,
    reader: &mut R,
) -> Result<(), R::Error>
where
    T: Element,
    A: Allocator,
    R: Read,
{
    let mut skip = start;
    for run in deque.segments_mut() {
        if skip >= run.len() {
            skip -= run.len();
            continue;
        }
        load_run(&mut run[skip..], reader)?;
        skip = 0;
    }
    Ok(())
}
