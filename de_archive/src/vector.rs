use devector::allocator_api2::alloc::Allocator;
use devector::{Devector, GrowthPolicy};
use embedded_io::{Read, Write};

use crate::element::{load_run, save_run, Element};
use crate::error::Result;
use crate::stream::{next_step, read_size, write_size};
use crate::Archive;

/// The elements are one contiguous run: byte-viewable element types are
/// written and read with a single call.
impl<T, const N: usize, G, A> Archive for Devector<T, N, G, A>
where
    T: Element + Default,
    G: GrowthPolicy,
    A: Allocator,
{
    fn save<W: Write>(&self, writer: &mut W) -> Result<(), W::Error> {
        write_size(writer, self.len())?;
        save_run(self.as_slice(), writer)
    }

    /// A count that fits the current capacity is loaded in place. A larger
    /// one is loaded into a fresh buffer that grows step by step, each step
    /// read before the next is allocated; the final capacity is exactly the
    /// count.
    fn load<R: Read>(&mut self, reader: &mut R) -> Result<(), R::Error> {
        let size = read_size(reader, self.max_size())?;
        if size <= self.capacity() {
            let front = size.min(self.front_free_capacity() + self.len());
            self.resize_front_with(front, T::default);
            self.resize_back_with(size, T::default);
            return load_run(self.as_mut_slice(), reader);
        }

        self.clear();
        while self.len() < size {
            let start = self.len();
            let step = next_step(start, size);
            self.try_reserve_back(step)?;
            self.resize_back_with(start + step, T::default);
            load_run(&mut self.as_mut_slice()[start..], reader)?;
        }
        Ok(())
    }
}
