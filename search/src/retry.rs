//! Backoff policy for indeterminate verdicts.
//!
//! # Policy
//!
//! - Each midpoint tolerates `limit` indeterminate attempts in total.
//! - Delay before retry `n` (0-based step): `initial_delay * 2^n`, capped at `max_delay`.
//! - Down-jitter: multiplier in `[1 - jitter_factor, 1.0]`.
//!
//! With `max_delay == initial_delay` and no jitter this is a fixed delay.

use std::time::Duration;

use oracle_config::SearchSettings;

/// Beyond this the cap always wins; keeps `powi` finite.
const MAX_BACKOFF_EXPONENT: u32 = 32;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Indeterminate attempts tolerated on one midpoint before giving up.
    pub limit: u32,
    /// Backoff delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            jitter_factor: 0.0,
        }
    }
}

impl RetryConfig {
    /// Retry immediately. Used where wall-clock delay only slows things down.
    #[must_use]
    pub fn immediate(limit: u32) -> Self {
        Self {
            limit,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter_factor: 0.0,
        }
    }
}

impl From<&SearchSettings> for RetryConfig {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            limit: settings.retry_limit,
            initial_delay: settings.retry_backoff,
            max_delay: settings.retry_max_backoff,
            jitter_factor: settings.retry_jitter,
        }
    }
}

/// Calculate retry delay with exponential backoff and jitter.
///
/// `backoff_step` is 0 before the first retry, 1 before the second, etc.
#[must_use]
pub fn calculate_retry_delay(backoff_step: u32, config: &RetryConfig) -> Duration {
    // Exponential backoff: initial_delay * 2^backoff_step
    let exponent = backoff_step.min(MAX_BACKOFF_EXPONENT) as i32;
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Down-jitter: multiply by random factor in [1 - jitter_factor, 1.0]
    let jitter_factor = config.jitter_factor.clamp(0.0, 1.0);
    let jitter = 1.0 - rand::random::<f64>() * jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}
