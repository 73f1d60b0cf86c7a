use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

use allocator_api2::alloc::Allocator;

use crate::devector::Devector;
use crate::policy::GrowthPolicy;

impl<T, U, const N: usize, const M: usize, G, H, A, B> PartialEq<Devector<U, M, H, B>>
    for Devector<T, N, G, A>
where
    T: PartialEq<U>,
    G: GrowthPolicy,
    H: GrowthPolicy,
    A: Allocator,
    B: Allocator,
{
    fn eq(&self, other: &Devector<U, M, H, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, const N: usize, G: GrowthPolicy, A: Allocator> Eq for Devector<T, N, G, A> {}

impl<T, U, const N: usize, G: GrowthPolicy, A: Allocator> PartialEq<[U]> for Devector<T, N, G, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, const N: usize, G: GrowthPolicy, A: Allocator> PartialEq<&[U]> for Devector<T, N, G, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, const K: usize, const N: usize, G: GrowthPolicy, A: Allocator> PartialEq<[U; K]>
    for Devector<T, N, G, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; K]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T, U, const N: usize, G: GrowthPolicy, A: Allocator> PartialEq<Vec<U>> for Devector<T, N, G, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Vec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

/// Lexicographic, like slices.
impl<T, const N: usize, const M: usize, G, H, A, B> PartialOrd<Devector<T, M, H, B>>
    for Devector<T, N, G, A>
where
    T: PartialOrd,
    G: GrowthPolicy,
    H: GrowthPolicy,
    A: Allocator,
    B: Allocator,
{
    fn partial_cmp(&self, other: &Devector<T, M, H, B>) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord, const N: usize, G: GrowthPolicy, A: Allocator> Ord for Devector<T, N, G, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, const N: usize, G: GrowthPolicy, A: Allocator> Hash for Devector<T, N, G, A> {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.as_slice().hash(state);
    }
}
