//! Binary search over an oracle.
//!
//! ```text
//! Searching ──TooLow/TooHigh──▶ Searching (interval narrowed, budget refilled)
//!     │ ──Indeterminate──▶ Searching (same midpoint, budget - 1, backoff)
//!     │ ──Correct──▶ Solved
//!     │ ──low > high──▶ Exhausted
//!     │ ──budget spent──▶ Fatal
//!     └ ──cancel flag set──▶ Cancelled
//! ```

use oracle_types::{Candidate, Probe, RetryBudget, SearchInterval, Verdict};

use oracle_transport::OracleTransport;

use crate::cancel::CancelFlag;
use crate::retry::{RetryConfig, calculate_retry_delay};
use crate::{SearchError, Solution};

/// Owns the retry policy and the cancel flag for one search domain.
///
/// The live interval and budget are locals of [`SearchController::search`];
/// nothing outlives a single run.
#[derive(Debug, Clone)]
pub struct SearchController {
    domain: SearchInterval,
    retry: RetryConfig,
    cancel: CancelFlag,
}

impl SearchController {
    #[must_use]
    pub fn new(domain: SearchInterval, retry: RetryConfig) -> Self {
        Self {
            domain,
            retry,
            cancel: CancelFlag::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub const fn domain(&self) -> SearchInterval {
        self.domain
    }

    #[must_use]
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// Run the search to a terminal state.
    ///
    /// Exactly one query is outstanding at a time; `&mut T` guarantees nobody
    /// else can use the transport meanwhile.
    pub async fn search<T>(&self, transport: &mut T) -> Result<Solution, SearchError>
    where
        T: OracleTransport + ?Sized,
    {
        let mut interval = self.domain;
        let mut budget = RetryBudget::new(self.retry.limit);
        let mut trace: Vec<Probe> = Vec::new();

        tracing::info!(
            transport = transport.name(),
            low = interval.low(),
            high = interval.high(),
            retry_limit = budget.limit(),
            "Starting search"
        );

        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!(%interval, probes = trace.len(), "Search cancelled");
                return Err(SearchError::Cancelled { interval });
            }

            let Some(mid) = interval.midpoint() else {
                tracing::warn!(
                    domain = %self.domain,
                    probes = trace.len(),
                    "Domain exhausted; oracle answers are inconsistent"
                );
                return Err(SearchError::Exhausted {
                    domain: self.domain,
                    probes: trace.len(),
                });
            };

            let attempt = budget.used() + 1;
            tracing::info!(
                candidate = %mid,
                low = interval.low(),
                high = interval.high(),
                attempt,
                "Probing"
            );

            let verdict = transport.query(mid).await;
            trace.push(Probe {
                candidate: mid,
                verdict: verdict.kind(),
                interval,
                attempt,
            });

            match verdict {
                Verdict::TooLow => {
                    interval.raise_low_past(mid);
                    budget = budget.refilled();
                    tracing::info!(candidate = %mid, %interval, "Too low; raised lower bound");
                }
                Verdict::TooHigh => {
                    interval.lower_high_below(mid);
                    budget = budget.refilled();
                    tracing::info!(candidate = %mid, %interval, "Too high; lowered upper bound");
                }
                Verdict::Correct(proof) => {
                    tracing::info!(value = %mid, probes = trace.len(), "Solved");
                    return Ok(Solution {
                        value: mid,
                        proof,
                        trace,
                    });
                }
                Verdict::Indeterminate(reason) => {
                    let step = budget.used();
                    let Some(next) = budget.take_one() else {
                        tracing::error!(
                            candidate = %mid,
                            attempts = budget.limit(),
                            reason = %reason,
                            "Retry budget exhausted; oracle unreachable"
                        );
                        return Err(SearchError::Unreachable {
                            candidate: mid,
                            attempts: budget.limit(),
                            last: reason,
                        });
                    };
                    budget = next;

                    let delay = calculate_retry_delay(step, &self.retry);
                    tracing::warn!(
                        candidate = %mid,
                        attempt,
                        remaining = budget.remaining(),
                        delay_ms = delay.as_millis(),
                        reason = %reason,
                        "Indeterminate verdict; retrying same candidate"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Queries a search of `domain` can need before converging, ignoring retries:
/// `ceil(log2(N)) + 1`.
#[must_use]
pub fn max_decisive_queries(domain: SearchInterval) -> u32 {
    let n = domain.len();
    if n <= 1 {
        return 1;
    }
    // ceil(log2(n)) for n >= 2
    (u128::BITS - (n - 1).leading_zeros()) + 1
}

impl Solution {
    /// Number of queries sent, retries included.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.trace.len()
    }

    /// Candidates in the order they were sent.
    pub fn candidates(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.trace.iter().map(|probe| probe.candidate)
    }
}
