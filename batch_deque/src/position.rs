//! (segment, index) positions inside a `BatchDeque`.

/// A position in a segmented buffer: `segment` is an index into the segment
/// map, `index` the offset inside that segment.
///
/// Slots are kept normalized, `index < SEGMENT_SIZE`. The one-past-the-end
/// slot of a full last segment is `(segments, 0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Slot {
    pub(crate) segment: usize,
    pub(crate) index: usize,
}

impl Slot {
    pub(crate) const ZERO: Slot = Slot::new(0, 0);

    pub(crate) const fn new(segment: usize, index: usize) -> Self {
        Self { segment, index }
    }

    /// Moves by `n` elements, forwards or backwards.
    ///
    /// Uses floor division: one step back from `(s, 0)` is `(s - 1, S - 1)`.
    #[inline]
    #[must_use]
    pub(crate) fn offset<const S: usize>(self, n: isize) -> Slot {
        let position = self.index as isize + n;
        let segment = self.segment as isize + position.div_euclid(S as isize);
        debug_assert!(segment >= 0, "slot moved before the first segment");
        Slot::new(segment as usize, position.rem_euclid(S as isize) as usize)
    }

    /// Number of elements from `self` up to `later`.
    #[inline]
    #[must_use]
    pub(crate) fn distance<const S: usize>(self, later: Slot) -> usize {
        later.linear::<S>() - self.linear::<S>()
    }

    /// Slot count from the start of the first segment.
    #[inline]
    #[must_use]
    pub(crate) fn linear<const S: usize>(self) -> usize {
        self.segment * S + self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_forward_within_and_across_segments() {
        let slot = Slot::new(2, 3);
        assert_eq!(slot.offset::<8>(0), slot);
        assert_eq!(slot.offset::<8>(4), Slot::new(2, 7));
        assert_eq!(slot.offset::<8>(5), Slot::new(3, 0));
        assert_eq!(slot.offset::<8>(21), Slot::new(5, 0));
        assert_eq!(slot.offset::<8>(22), Slot::new(5, 1));
    }

    #[test]
    fn test_offset_backward_uses_floor_division() {
        let slot = Slot::new(3, 2);
        assert_eq!(slot.offset::<8>(-2), Slot::new(3, 0));
        assert_eq!(slot.offset::<8>(-3), Slot::new(2, 7));
        assert_eq!(slot.offset::<8>(-10), Slot::new(2, 0));
        assert_eq!(slot.offset::<8>(-11), Slot::new(1, 7));
        assert_eq!(slot.offset::<8>(-26), Slot::new(0, 0));
        assert_eq!(Slot::new(1, 0).offset::<2>(-1), Slot::new(0, 1));
    }

    #[test]
    fn test_offset_round_trips() {
        let start = Slot::new(4, 5);
        for n in -33..40 {
            let moved = start.offset::<7>(n);
            assert!(moved.index < 7);
            assert_eq!(moved.offset::<7>(-n), start);
        }
    }

    #[test]
    fn test_distance_and_ordering() {
        let begin = Slot::new(1, 6);
        let end = Slot::new(3, 2);
        assert_eq!(begin.distance::<8>(end), 12);
        assert_eq!(begin.distance::<8>(begin), 0);
        assert_eq!(begin.offset::<8>(12), end);
        assert!(begin < end);
        assert!(Slot::new(1, 7) < Slot::new(2, 0));
        assert_eq!(end.linear::<8>(), 26);
    }
}
