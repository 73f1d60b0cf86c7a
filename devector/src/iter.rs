use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::slice;

use allocator_api2::alloc::Allocator;

use crate::devector::Devector;
use crate::error::infallible;
use crate::policy::GrowthPolicy;

/// Owning iterator over the elements of a `Devector`
///
/// Elements are taken from either end in O(1).
pub struct IntoIter<T, const N: usize, G: GrowthPolicy, A: Allocator> {
    inner: Devector<T, N, G, A>,
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> IntoIter<T, N, G, A> {
    /// The elements not yet yielded.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> Iterator for IntoIter<T, N, G, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inner.len();
        (len, Some(len))
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> DoubleEndedIterator
    for IntoIter<T, N, G, A>
{
    fn next_back(&mut self) -> Option<T> {
        self.inner.pop_back()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> ExactSizeIterator for IntoIter<T, N, G, A> {}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> FusedIterator for IntoIter<T, N, G, A> {}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> IntoIterator for Devector<T, N, G, A> {
    type Item = T;
    type IntoIter = IntoIter<T, N, G, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { inner: self }
    }
}

impl<'a, T, const N: usize, G: GrowthPolicy, A: Allocator> IntoIterator
    for &'a Devector<T, N, G, A>
{
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, const N: usize, G: GrowthPolicy, A: Allocator> IntoIterator
    for &'a mut Devector<T, N, G, A>
{
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator> Extend<T> for Devector<T, N, G, A> {
    /// Makes room for the iterator's lower size bound once, growing by the
    /// policy, then pushes each item.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        infallible(self.try_reserve_back_amortized(lower));
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Copy + 'a, const N: usize, G: GrowthPolicy, A: Allocator> Extend<&'a T>
    for Devector<T, N, G, A>
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator + Default> FromIterator<T>
    for Devector<T, N, G, A>
{
    /// Allocates exactly the iterator's lower size bound up front.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut dv = Self::new_in(A::default());
        dv.reserve_back(iter.size_hint().0);
        dv.extend(iter);
        dv
    }
}

impl<T, const K: usize, const N: usize, G: GrowthPolicy, A: Allocator + Default> From<[T; K]>
    for Devector<T, N, G, A>
{
    fn from(items: [T; K]) -> Self {
        items.into_iter().collect()
    }
}

impl<T, const N: usize, G: GrowthPolicy, A: Allocator + Default> From<Vec<T>>
    for Devector<T, N, G, A>
{
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}
