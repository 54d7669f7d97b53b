//! Growth policy parameters.

use crate::error::BufferError;

/// Capacity growth policy for a buffer.
///
/// Growth is geometric: a buffer below `min_capacity` jumps straight to
/// `min_capacity`, otherwise its capacity is scaled by
/// `growth_numerator / growth_denominator`. The result is never smaller than
/// the immediate request. Attached to a buffer at construction and immutable
/// afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Capacity used when growing from an empty or near-empty buffer.
    ///
    /// Default: 16 elements.
    pub min_capacity: usize,

    /// Numerator of the growth factor.
    ///
    /// Default: 16 (with the default denominator, a factor of 1.6).
    pub growth_numerator: usize,

    /// Denominator of the growth factor. Must be non-zero and strictly
    /// smaller than `growth_numerator`.
    ///
    /// Default: 10.
    pub growth_denominator: usize,
}

impl GrowthPolicy {
    /// Default minimum capacity in elements.
    pub const DEFAULT_MIN_CAPACITY: usize = 16;

    /// Default growth factor numerator.
    pub const DEFAULT_GROWTH_NUMERATOR: usize = 16;

    /// Default growth factor denominator.
    pub const DEFAULT_GROWTH_DENOMINATOR: usize = 10;

    /// The default policy: minimum capacity 16, growth factor 1.6.
    pub const DEFAULT: Self = Self {
        min_capacity: Self::DEFAULT_MIN_CAPACITY,
        growth_numerator: Self::DEFAULT_GROWTH_NUMERATOR,
        growth_denominator: Self::DEFAULT_GROWTH_DENOMINATOR,
    };

    /// Create a policy with the given minimum capacity and the default
    /// growth factor.
    pub const fn with_min_capacity(min_capacity: usize) -> Self {
        Self {
            min_capacity,
            ..Self::DEFAULT
        }
    }

    /// Check that growth is geometric.
    ///
    /// The factor must be strictly greater than 1.0, and a step taken from
    /// `min_capacity` must add at least one whole element. Since steps are
    /// rounded down, a factor that is too fine for the floor would otherwise
    /// degrade to one-slot growth and a reallocation per append.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidPolicy`] if the denominator is zero, the
    /// numerator does not exceed it, or
    /// `min_capacity * (growth_numerator - growth_denominator)` is smaller
    /// than `growth_denominator`.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.growth_denominator == 0 {
            return Err(BufferError::InvalidPolicy {
                reason: "growth_denominator must be non-zero".into(),
            });
        }
        if self.growth_numerator <= self.growth_denominator {
            return Err(BufferError::InvalidPolicy {
                reason: format!(
                    "growth factor {}/{} must be greater than 1",
                    self.growth_numerator, self.growth_denominator
                ),
            });
        }
        let excess = self.growth_numerator - self.growth_denominator;
        if self
            .min_capacity
            .checked_mul(excess)
            .is_some_and(|step| step < self.growth_denominator)
        {
            return Err(BufferError::InvalidPolicy {
                reason: format!(
                    "growth factor {}/{} adds no element to min_capacity {}",
                    self.growth_numerator, self.growth_denominator, self.min_capacity
                ),
            });
        }
        Ok(())
    }

    /// Capacity to grow to when `required` elements must fit into a buffer
    /// that currently holds `capacity`.
    ///
    /// Callers only invoke this when `required > capacity`. The step is
    /// `floor(capacity * (numerator - denominator) / denominator)`, which for
    /// a validated policy is at least `capacity / (2 * min_capacity)` once
    /// `capacity >= min_capacity`. Overflow in the step saturates; the engine
    /// falls back to `required` if the saturated candidate cannot be sized in
    /// bytes.
    pub fn next_capacity(&self, capacity: usize, required: usize) -> usize {
        let candidate = if capacity < self.min_capacity {
            self.min_capacity
        } else {
            let excess = self.growth_numerator.saturating_sub(self.growth_denominator);
            let step = capacity.saturating_mul(excess) / self.growth_denominator.max(1);
            capacity.saturating_add(step)
        };
        candidate.max(required)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}
