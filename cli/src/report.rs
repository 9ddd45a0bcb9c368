//! Stdout rendering of a finished search.
//!
//! Stdout carries only the result; diagnostics go through `tracing`.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};
use oracle_search::{SearchError, Solution};
use oracle_types::ProofBody;

pub fn solved(solution: &Solution) -> String {
    let observed: DateTime<Utc> = solution.proof.observed_at().into();
    let mut out = String::new();
    let _ = writeln!(out, "{}", solution.value);
    match solution.proof.body() {
        ProofBody::ExitStatus { code, .. } => {
            let _ = writeln!(out, "proof: exit code {code}");
        }
        ProofBody::Response { .. } => {
            let _ = writeln!(out, "proof: oracle response");
        }
    }
    let text = solution.proof.text();
    if !text.is_empty() {
        let _ = writeln!(out, "{text}");
    }
    let _ = writeln!(
        out,
        "observed at {} after {} queries",
        observed.to_rfc3339_opts(SecondsFormat::Secs, true),
        solution.queries()
    );
    out
}

pub fn failed(error: &SearchError) -> String {
    format!("search {}: {error}\n", error.state())
}
