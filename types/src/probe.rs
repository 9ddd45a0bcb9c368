//! Search trace entries.

use std::fmt;

use crate::{Candidate, SearchInterval, VerdictKind};

/// One query the controller sent, and what came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub candidate: Candidate,
    pub verdict: VerdictKind,
    /// Interval in force when the query was sent.
    pub interval: SearchInterval,
    /// 1-based attempt number on this candidate.
    pub attempt: u32,
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.candidate, self.verdict, self.interval)?;
        if self.attempt > 1 {
            write!(f, " (attempt {})", self.attempt)?;
        }
        Ok(())
    }
}
