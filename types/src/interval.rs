//! Closed search interval.
//!
//! The interval is the only state that survives between probes. Every update
//! either strictly shrinks it or leaves it exhausted (`low > high`); nothing
//! ever grows it.

use std::fmt;

use thiserror::Error;

use crate::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntervalError {
    #[error("interval lower bound ({low}) exceeds upper bound ({high})")]
    Inverted { low: i64, high: i64 },
}

/// Closed, inclusive range `[low, high]` known to contain the hidden value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchInterval {
    low: i64,
    high: i64,
}

impl SearchInterval {
    /// Create the initial search domain. Rejects `low > high`.
    pub fn new(low: i64, high: i64) -> Result<Self, IntervalError> {
        if low > high {
            return Err(IntervalError::Inverted { low, high });
        }
        Ok(Self { low, high })
    }

    #[must_use]
    pub const fn low(self) -> i64 {
        self.low
    }

    #[must_use]
    pub const fn high(self) -> i64 {
        self.high
    }

    /// True once the bounds have crossed and no candidate remains.
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        self.low > self.high
    }

    #[must_use]
    pub const fn contains(self, value: i64) -> bool {
        self.low <= value && value <= self.high
    }

    /// Number of candidates left. Zero when exhausted.
    #[must_use]
    pub fn len(self) -> u128 {
        if self.is_exhausted() {
            return 0;
        }
        (i128::from(self.high) - i128::from(self.low) + 1) as u128
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Floor midpoint `floor((low + high) / 2)`, or `None` when exhausted.
    ///
    /// For even-width intervals the lower of the two middle values is chosen,
    /// so `[1, 2]` probes `1` first. Computed in `i128` so the sum cannot overflow.
    #[must_use]
    pub fn midpoint(self) -> Option<Candidate> {
        if self.is_exhausted() {
            return None;
        }
        let sum = i128::from(self.low) + i128::from(self.high);
        Some(Candidate::new(sum.div_euclid(2) as i64))
    }

    /// The hidden value is above `mid`: move `low` to `mid + 1`.
    ///
    /// At `i64::MAX` there is nothing above, so the interval is collapsed instead.
    pub fn raise_low_past(&mut self, mid: Candidate) {
        match mid.value().checked_add(1) {
            Some(next) => self.low = next,
            None => {
                // mid == i64::MAX only when low == high == i64::MAX
                self.high = mid.value() - 1;
            }
        }
    }

    /// The hidden value is below `mid`: move `high` to `mid - 1`.
    ///
    /// At `i64::MIN` there is nothing below, so the interval is collapsed instead.
    pub fn lower_high_below(&mut self, mid: Candidate) {
        match mid.value().checked_sub(1) {
            Some(next) => self.high = next,
            None => {
                self.high = mid.value();
                self.low = mid.value() + 1;
            }
        }
    }
}

impl fmt::Display for SearchInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}
