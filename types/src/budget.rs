//! Retry budget invariant type.

/// Bounded number of indeterminate attempts tolerated on one midpoint.
///
/// A budget always has at least one attempt. `take_one` hands back the
/// decremented budget while attempts remain and `None` once the final attempt
/// has been spent, so a probe can never be retried forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    limit: u32,
    remaining: u32,
}

impl RetryBudget {
    /// A budget of `limit` attempts. Zero is raised to one.
    #[must_use]
    pub fn new(limit: u32) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            remaining: limit,
        }
    }

    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    #[must_use]
    pub const fn remaining(self) -> u32 {
        self.remaining
    }

    /// Attempts spent so far.
    #[must_use]
    pub const fn used(self) -> u32 {
        self.limit - self.remaining
    }

    /// Spend one attempt. Returns `None` when that was the last one.
    #[must_use]
    pub fn take_one(self) -> Option<RetryBudget> {
        match self.remaining {
            0 | 1 => None,
            n => Some(Self {
                limit: self.limit,
                remaining: n - 1,
            }),
        }
    }

    /// Full budget again, for the next midpoint.
    #[must_use]
    pub fn refilled(self) -> Self {
        Self::new(self.limit)
    }
}
