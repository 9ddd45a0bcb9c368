//! Core domain types for oracle search.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Transports produce [`Verdict`]s, the search controller consumes them and narrows a
//! [`SearchInterval`] under a [`RetryBudget`].

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod budget;
mod interval;
mod probe;
mod verdict;

pub use budget::RetryBudget;
pub use interval::{IntervalError, SearchInterval};
pub use probe::Probe;
pub use verdict::{IndeterminateReason, Proof, ProofBody, Verdict, VerdictKind};

use std::fmt;

// ============================================================================
// Candidate
// ============================================================================

/// A single integer guess submitted to an oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Candidate(i64);

impl Candidate {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Wire encoding shared by both transports: decimal ASCII plus a line terminator.
    #[must_use]
    pub fn encode_line(self) -> String {
        format!("{}\n", self.0)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Candidate {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
