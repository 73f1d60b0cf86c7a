use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;
use core::slice;

use allocator_api2::alloc::Allocator;

use crate::deque::BatchDeque;
use crate::position::Slot;

/// Iterator over the elements of a `BatchDeque`
///
/// Skipping with `nth` / `nth_back` is O(1).
pub struct Iter<'a, T, const SEGMENT_SIZE: usize> {
    map: &'a [NonNull<T>],
    head: Slot,
    tail: Slot,
    _marker: PhantomData<&'a T>,
}

impl<'a, T, const SEGMENT_SIZE: usize> Iter<'a, T, SEGMENT_SIZE> {
    pub(crate) fn new(map: &'a [NonNull<T>], head: Slot, tail: Slot) -> Self {
        Self {
            map,
            head,
            tail,
            _marker: PhantomData,
        }
    }

    fn get(&self, slot: Slot) -> &'a T {
        unsafe { &*self.map[slot.segment].as_ptr().add(slot.index) }
    }
}

impl<T, const SEGMENT_SIZE: usize> Clone for Iter<'_, T, SEGMENT_SIZE> {
    fn clone(&self) -> Self {
        Self::new(self.map, self.head, self.tail)
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> Iterator for Iter<'a, T, SEGMENT_SIZE> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.head == self.tail {
            return None;
        }
        let item = self.get(self.head);
        self.head = self.head.offset::<SEGMENT_SIZE>(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.head.distance::<SEGMENT_SIZE>(self.tail);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.len() {
            self.head = self.tail;
            return None;
        }
        self.head = self.head.offset::<SEGMENT_SIZE>(n as isize);
        self.next()
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> DoubleEndedIterator for Iter<'a, T, SEGMENT_SIZE> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.head == self.tail {
            return None;
        }
        self.tail = self.tail.offset::<SEGMENT_SIZE>(-1);
        Some(self.get(self.tail))
    }

    fn nth_back(&mut self, n: usize) -> Option<&'a T> {
        if n >= self.len() {
            self.tail = self.head;
            return None;
        }
        self.tail = self.tail.offset::<SEGMENT_SIZE>(-(n as isize));
        self.next_back()
    }
}

impl<T, const SEGMENT_SIZE: usize> ExactSizeIterator for Iter<'_, T, SEGMENT_SIZE> {}

impl<T, const SEGMENT_SIZE: usize> FusedIterator for Iter<'_, T, SEGMENT_SIZE> {}

// Shares `&T` only, like `slice::Iter`.
unsafe impl<T: Sync, const SEGMENT_SIZE: usize> Send for Iter<'_, T, SEGMENT_SIZE> {}
unsafe impl<T: Sync, const SEGMENT_SIZE: usize> Sync for Iter<'_, T, SEGMENT_SIZE> {}

/// Mutable iterator over the elements of a `BatchDeque`
pub struct IterMut<'a, T, const SEGMENT_SIZE: usize> {
    map: &'a [NonNull<T>],
    head: Slot,
    tail: Slot,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T, const SEGMENT_SIZE: usize> IterMut<'a, T, SEGMENT_SIZE> {
    pub(crate) fn new(map: &'a [NonNull<T>], head: Slot, tail: Slot) -> Self {
        Self {
            map,
            head,
            tail,
            _marker: PhantomData,
        }
    }

    // Each slot is handed out once, so the returned references never alias.
    fn get(&self, slot: Slot) -> &'a mut T {
        unsafe { &mut *self.map[slot.segment].as_ptr().add(slot.index) }
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> Iterator for IterMut<'a, T, SEGMENT_SIZE> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.head == self.tail {
            return None;
        }
        let item = self.get(self.head);
        self.head = self.head.offset::<SEGMENT_SIZE>(1);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.head.distance::<SEGMENT_SIZE>(self.tail);
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a mut T> {
        if n >= self.len() {
            self.head = self.tail;
            return None;
        }
        self.head = self.head.offset::<SEGMENT_SIZE>(n as isize);
        self.next()
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> DoubleEndedIterator for IterMut<'a, T, SEGMENT_SIZE> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.head == self.tail {
            return None;
        }
        self.tail = self.tail.offset::<SEGMENT_SIZE>(-1);
        Some(self.get(self.tail))
    }

    fn nth_back(&mut self, n: usize) -> Option<&'a mut T> {
        if n >= self.len() {
            self.tail = self.head;
            return None;
        }
        self.tail = self.tail.offset::<SEGMENT_SIZE>(-(n as isize));
        self.next_back()
    }
}

impl<T, const SEGMENT_SIZE: usize> ExactSizeIterator for IterMut<'_, T, SEGMENT_SIZE> {}

impl<T, const SEGMENT_SIZE: usize> FusedIterator for IterMut<'_, T, SEGMENT_SIZE> {}

unsafe impl<T: Send, const SEGMENT_SIZE: usize> Send for IterMut<'_, T, SEGMENT_SIZE> {}
unsafe impl<T: Sync, const SEGMENT_SIZE: usize> Sync for IterMut<'_, T, SEGMENT_SIZE> {}

/// Owning iterator over the elements of a `BatchDeque`
pub struct IntoIter<T, const SEGMENT_SIZE: usize, A: Allocator> {
    inner: BatchDeque<T, SEGMENT_SIZE, A>,
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> Iterator for IntoIter<T, SEGMENT_SIZE, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.inner.len();
        (len, Some(len))
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> DoubleEndedIterator
    for IntoIter<T, SEGMENT_SIZE, A>
{
    fn next_back(&mut self) -> Option<T> {
        self.inner.pop_back()
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> ExactSizeIterator for IntoIter<T, SEGMENT_SIZE, A> {}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> FusedIterator for IntoIter<T, SEGMENT_SIZE, A> {}

/// Live range of segment `segment`, given the deque's first and
/// one-past-last slots.
fn live_range<const SEGMENT_SIZE: usize>(segment: usize, begin: Slot, end: Slot) -> (usize, usize) {
    let start = if segment == begin.segment { begin.index } else { 0 };
    let stop = if segment == end.segment {
        end.index
    } else {
        SEGMENT_SIZE
    };
    (start, stop)
}

/// Segments holding at least one element: `[begin.segment, last)`.
fn segment_span(begin: Slot, end: Slot) -> (usize, usize) {
    if begin == end {
        (begin.segment, begin.segment)
    } else {
        (begin.segment, end.segment + usize::from(end.index > 0))
    }
}

/// Iterator over the live part of each segment of a `BatchDeque`
///
/// Every item is a non-empty slice; their concatenation is the deque.
pub struct Segments<'a, T, const SEGMENT_SIZE: usize> {
    map: &'a [NonNull<T>],
    begin: Slot,
    end: Slot,
    head: usize,
    tail: usize,
}

impl<'a, T, const SEGMENT_SIZE: usize> Segments<'a, T, SEGMENT_SIZE> {
    pub(crate) fn new(map: &'a [NonNull<T>], begin: Slot, end: Slot) -> Self {
        let (head, tail) = segment_span(begin, end);
        Self {
            map,
            begin,
            end,
            head,
            tail,
        }
    }

    fn get(&self, segment: usize) -> &'a [T] {
        let (start, stop) = live_range::<SEGMENT_SIZE>(segment, self.begin, self.end);
        unsafe { slice::from_raw_parts(self.map[segment].as_ptr().add(start), stop - start) }
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> Iterator for Segments<'a, T, SEGMENT_SIZE> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<&'a [T]> {
        if self.head == self.tail {
            return None;
        }
        let run = self.get(self.head);
        self.head += 1;
        Some(run)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tail - self.head;
        (remaining, Some(remaining))
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> DoubleEndedIterator for Segments<'a, T, SEGMENT_SIZE> {
    fn next_back(&mut self) -> Option<&'a [T]> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        Some(self.get(self.tail))
    }
}

impl<T, const SEGMENT_SIZE: usize> ExactSizeIterator for Segments<'_, T, SEGMENT_SIZE> {}

impl<T, const SEGMENT_SIZE: usize> FusedIterator for Segments<'_, T, SEGMENT_SIZE> {}

unsafe impl<T: Sync, const SEGMENT_SIZE: usize> Send for Segments<'_, T, SEGMENT_SIZE> {}
unsafe impl<T: Sync, const SEGMENT_SIZE: usize> Sync for Segments<'_, T, SEGMENT_SIZE> {}

/// Mutable iterator over the live part of each segment of a `BatchDeque`
pub struct SegmentsMut<'a, T, const SEGMENT_SIZE: usize> {
    map: &'a [NonNull<T>],
    begin: Slot,
    end: Slot,
    head: usize,
    tail: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T, const SEGMENT_SIZE: usize> SegmentsMut<'a, T, SEGMENT_SIZE> {
    pub(crate) fn new(map: &'a [NonNull<T>], begin: Slot, end: Slot) -> Self {
        let (head, tail) = segment_span(begin, end);
        Self {
            map,
            begin,
            end,
            head,
            tail,
            _marker: PhantomData,
        }
    }

    fn get(&self, segment: usize) -> &'a mut [T] {
        let (start, stop) = live_range::<SEGMENT_SIZE>(segment, self.begin, self.end);
        unsafe { slice::from_raw_parts_mut(self.map[segment].as_ptr().add(start), stop - start) }
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> Iterator for SegmentsMut<'a, T, SEGMENT_SIZE> {
    type Item = &'a mut [T];

    fn next(&mut self) -> Option<&'a mut [T]> {
        if self.head == self.tail {
            return None;
        }
        let run = self.get(self.head);
        self.head += 1;
        Some(run)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tail - self.head;
        (remaining, Some(remaining))
    }
}

impl<'a, T, const SEGMENT_SIZE: usize> DoubleEndedIterator for SegmentsMut<'a, T, SEGMENT_SIZE> {
    fn next_back(&mut self) -> Option<&'a mut [T]> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        Some(self.get(self.tail))
    }
}

impl<T, const SEGMENT_SIZE: usize> ExactSizeIterator for SegmentsMut<'_, T, SEGMENT_SIZE> {}

impl<T, const SEGMENT_SIZE: usize> FusedIterator for SegmentsMut<'_, T, SEGMENT_SIZE> {}

unsafe impl<T: Send, const SEGMENT_SIZE: usize> Send for SegmentsMut<'_, T, SEGMENT_SIZE> {}
unsafe impl<T: Sync, const SEGMENT_SIZE: usize> Sync for SegmentsMut<'_, T, SEGMENT_SIZE> {}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> IntoIterator for BatchDeque<T, SEGMENT_SIZE, A> {
    type Item = T;
    type IntoIter = IntoIter<T, SEGMENT_SIZE, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { inner: self }
    }
}

impl<'a, T, const SEGMENT_SIZE: usize, A: Allocator> IntoIterator
    for &'a BatchDeque<T, SEGMENT_SIZE, A>
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T, SEGMENT_SIZE>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, const SEGMENT_SIZE: usize, A: Allocator> IntoIterator
    for &'a mut BatchDeque<T, SEGMENT_SIZE, A>
{
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, SEGMENT_SIZE>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator> Extend<T> for BatchDeque<T, SEGMENT_SIZE, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve_back(lower);
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: Copy + 'a, const SEGMENT_SIZE: usize, A: Allocator> Extend<&'a T>
    for BatchDeque<T, SEGMENT_SIZE, A>
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, const SEGMENT_SIZE: usize, A: Allocator + Default> FromIterator<T>
    for BatchDeque<T, SEGMENT_SIZE, A>
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut dq = Self::new_in(A::default());
        dq.extend(iter);
        dq
    }
}

impl<T, const K: usize, const SEGMENT_SIZE: usize, A: Allocator + Default> From<[T; K]>
    for BatchDeque<T, SEGMENT_SIZE, A>
{
    fn from(items: [T; K]) -> Self {
        items.into_iter().collect()
    }
}
