//! Adaptive oracle search.
//!
//! [`SearchController`] narrows a [`SearchInterval`] by binary search, asking
//! an [`OracleTransport`] one candidate at a time. Indeterminate verdicts
//! never move the bounds; they are retried on the same candidate under a
//! per-midpoint [`RetryBudget`](oracle_types::RetryBudget) with exponential
//! backoff ([`retry`]).
//!
//! [`run`] is the whole pipeline: build the transport once, then search.

pub mod cancel;
pub mod controller;
pub mod retry;

pub use cancel::CancelFlag;
pub use controller::{SearchController, max_decisive_queries};
pub use retry::{RetryConfig, calculate_retry_delay};

use oracle_config::OracleConfig;
use oracle_transport::{OracleTransport, TransportError, TransportMode};
use oracle_types::{Candidate, IndeterminateReason, Probe, Proof, SearchInterval};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

/// A solved search: the accepted value, the oracle's evidence and every probe sent.
#[derive(Debug, Clone)]
pub struct Solution {
    pub value: Candidate,
    pub proof: Proof,
    pub trace: Vec<Probe>,
}

/// Every way a search can end without a solution.
#[derive(Debug, Error)]
pub enum SearchError {
    /// `low > high`: no candidate is left, so the oracle contradicted itself.
    #[error("domain {domain} exhausted after {probes} probes: oracle answers are inconsistent")]
    Exhausted {
        domain: SearchInterval,
        probes: usize,
    },
    #[error("oracle unreachable: {attempts} indeterminate attempts on {candidate}, last error: {last}")]
    Unreachable {
        candidate: Candidate,
        attempts: u32,
        #[source]
        last: IndeterminateReason,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("search cancelled with {interval} still open")]
    Cancelled { interval: SearchInterval },
}

impl SearchError {
    /// Terminal state name used in logs and CLI output.
    #[must_use]
    pub const fn state(&self) -> &'static str {
        match self {
            SearchError::Exhausted { .. } => "exhausted",
            SearchError::Unreachable { .. } | SearchError::Transport(_) => "fatal",
            SearchError::Cancelled { .. } => "cancelled",
        }
    }
}

impl SearchController {
    #[must_use]
    pub fn from_config(config: &OracleConfig) -> Self {
        Self::new(config.search.domain, RetryConfig::from(&config.search))
    }
}

/// Build the transport for `mode`, then search the configured domain.
///
/// Transport construction failures are returned as [`SearchError::Transport`]
/// before any query is sent.
pub async fn run(
    mode: TransportMode,
    config: &OracleConfig,
    cancel: CancelFlag,
) -> Result<Solution, SearchError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("search", %run_id, mode = mode.as_str());

    async move {
        let mut transport = oracle_transport::connect(mode, config).await?;
        search_with(config, &mut *transport, cancel).await
    }
    .instrument(span)
    .await
}

/// Search the configured domain over an already-built transport.
pub async fn search_with<T>(
    config: &OracleConfig,
    transport: &mut T,
    cancel: CancelFlag,
) -> Result<Solution, SearchError>
where
    T: OracleTransport + ?Sized,
{
    SearchController::from_config(config)
        .with_cancel(cancel)
        .search(transport)
        .await
}
