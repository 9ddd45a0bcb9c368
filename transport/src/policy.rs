//! Verdict classification rules.
//!
//! Both rules are plain values so a different oracle only needs different
//! configuration, not different transport code.

use oracle_config::{LocalSettings, RemoteSettings};

/// Raw classification before the transport attaches its proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    TooLow,
    TooHigh,
    /// Neither sentinel matched: the oracle accepted the guess.
    Accepted,
}

/// Exit-status rule for the local process oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodePolicy {
    pub too_low: i32,
    pub too_high: i32,
}

impl ExitCodePolicy {
    #[must_use]
    pub const fn new(too_low: i32, too_high: i32) -> Self {
        Self { too_low, too_high }
    }

    #[must_use]
    pub const fn classify(&self, code: i32) -> Classification {
        if code == self.too_low {
            Classification::TooLow
        } else if code == self.too_high {
            Classification::TooHigh
        } else {
            Classification::Accepted
        }
    }
}

impl From<&LocalSettings> for ExitCodePolicy {
    fn from(settings: &LocalSettings) -> Self {
        Self::new(settings.too_low_code, settings.too_high_code)
    }
}

/// Case-sensitive substring rule for the remote text oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPolicy {
    pub too_low: String,
    pub too_high: String,
}

impl MarkerPolicy {
    #[must_use]
    pub fn new(too_low: impl Into<String>, too_high: impl Into<String>) -> Self {
        Self {
            too_low: too_low.into(),
            too_high: too_high.into(),
        }
    }

    /// Look only for the sentinel markers. Used for bodies that may be incomplete.
    #[must_use]
    pub fn find_marker(&self, response: &str) -> Option<Classification> {
        if response.contains(&self.too_low) {
            Some(Classification::TooLow)
        } else if response.contains(&self.too_high) {
            Some(Classification::TooHigh)
        } else {
            None
        }
    }

    /// Classify a complete response. Blank responses are never accepted.
    #[must_use]
    pub fn classify(&self, response: &str) -> Option<Classification> {
        if let Some(marker) = self.find_marker(response) {
            return Some(marker);
        }
        if response.trim().is_empty() {
            None
        } else {
            Some(Classification::Accepted)
        }
    }
}

impl From<&RemoteSettings> for MarkerPolicy {
    fn from(settings: &RemoteSettings) -> Self {
        Self::new(
            settings.too_low_marker.clone(),
            settings.too_high_marker.clone(),
        )
    }
}
