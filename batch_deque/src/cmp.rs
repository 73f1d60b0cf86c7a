use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

use allocator_api2::alloc::Allocator;

use crate::deque::BatchDeque;

impl<T, U, const N: usize, const M: usize, A, B> PartialEq<BatchDeque<U, M, B>>
    for BatchDeque<T, N, A>
where
    T: PartialEq<U>,
    A: Allocator,
    B: Allocator,
{
    fn eq(&self, other: &BatchDeque<U, M, B>) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<T: Eq, const N: usize, A: Allocator> Eq for BatchDeque<T, N, A> {}

impl<T, U, const N: usize, A: Allocator> PartialEq<[U]> for BatchDeque<T, N, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a == b)
    }
}

impl<T, U, const N: usize, A: Allocator> PartialEq<&[U]> for BatchDeque<T, N, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        *self == **other
    }
}

impl<T, U, const K: usize, const N: usize, A: Allocator> PartialEq<[U; K]> for BatchDeque<T, N, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; K]) -> bool {
        *self == other[..]
    }
}

impl<T, U, const N: usize, A: Allocator> PartialEq<Vec<U>> for BatchDeque<T, N, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        *self == other[..]
    }
}

/// Lexicographic, like slices.
impl<T, const N: usize, const M: usize, A, B> PartialOrd<BatchDeque<T, M, B>>
    for BatchDeque<T, N, A>
where
    T: PartialOrd,
    A: Allocator,
    B: Allocator,
{
    fn partial_cmp(&self, other: &BatchDeque<T, M, B>) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, const N: usize, A: Allocator> Ord for BatchDeque<T, N, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

// Length prefix, then the elements in order.
impl<T: Hash, const N: usize, A: Allocator> Hash for BatchDeque<T, N, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for item in self {
            item.hash(state);
        }
    }
}
