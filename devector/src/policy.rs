/// Strategy deciding how a [`Devector`](crate::Devector) grows and when
/// `shrink_to_fit` actually shrinks.
///
/// Policies are zero-sized marker types: every method is an associated
/// function, so the choice is resolved at compile time.
pub trait GrowthPolicy {
    /// Upper bound on capacity regardless of element size.
    const MAX_CAPACITY: usize = usize::MAX;

    /// Capacity to allocate when a buffer of `capacity` slots is full.
    ///
    /// The container takes the larger of this value and what the operation
    /// strictly needs, clamped to its maximum size.
    fn new_capacity(capacity: usize) -> usize;

    /// Whether `shrink_to_fit` should release memory.
    fn should_shrink(size: usize, capacity: usize, small_buffer_size: usize) -> bool;
}

/// Grows by a factor of four (16 slots from empty) and shrinks only when the
/// elements fit into the inline buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefaultGrowthPolicy;

impl GrowthPolicy for DefaultGrowthPolicy {
    #[inline]
    fn new_capacity(capacity: usize) -> usize {
        if capacity == 0 {
            16
        } else {
            capacity.saturating_mul(4)
        }
    }

    #[inline]
    fn should_shrink(size: usize, _capacity: usize, small_buffer_size: usize) -> bool {
        size <= small_buffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_growth_from_zero() {
        assert_eq!(DefaultGrowthPolicy::new_capacity(0), 16);
        assert_eq!(DefaultGrowthPolicy::new_capacity(16), 64);
        assert_eq!(DefaultGrowthPolicy::new_capacity(usize::MAX / 2), usize::MAX);
    }

    #[test]
    fn test_default_should_shrink() {
        assert!(DefaultGrowthPolicy::should_shrink(3, 64, 4));
        assert!(DefaultGrowthPolicy::should_shrink(0, 64, 0));
        assert!(!DefaultGrowthPolicy::should_shrink(5, 64, 4));
    }
}
