//! Oracle verdicts and the evidence attached to them.

use std::fmt;
use std::time::{Duration, SystemTime};

use thiserror::Error;

/// Classified answer to a single query.
///
/// `Indeterminate` says nothing about where the hidden value lies. It is a
/// transport failure, and the controller must never narrow on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    TooLow,
    TooHigh,
    Correct(Proof),
    Indeterminate(IndeterminateReason),
}

impl Verdict {
    #[must_use]
    pub const fn kind(&self) -> VerdictKind {
        match self {
            Verdict::TooLow => VerdictKind::TooLow,
            Verdict::TooHigh => VerdictKind::TooHigh,
            Verdict::Correct(_) => VerdictKind::Correct,
            Verdict::Indeterminate(_) => VerdictKind::Indeterminate,
        }
    }

    #[must_use]
    pub const fn is_indeterminate(&self) -> bool {
        matches!(self, Verdict::Indeterminate(_))
    }
}

/// Payload-free verdict tag, used in traces and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictKind {
    TooLow,
    TooHigh,
    Correct,
    Indeterminate,
}

impl VerdictKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            VerdictKind::TooLow => "too-low",
            VerdictKind::TooHigh => "too-high",
            VerdictKind::Correct => "correct",
            VerdictKind::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a query produced no usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndeterminateReason {
    #[error("oracle did not answer within {}ms", .after.as_millis())]
    Timeout { after: Duration },
    #[error("failed to spawn oracle process: {0}")]
    Spawn(String),
    #[error("failed to connect to oracle: {0}")]
    Connect(String),
    #[error("oracle I/O failed: {0}")]
    Io(String),
    #[error("oracle closed the connection before sending a prompt")]
    PromptNotReceived,
    #[error("oracle returned an empty response")]
    EmptyResponse,
    #[error("oracle response was cut off after {bytes} bytes without a verdict marker")]
    TruncatedResponse { bytes: usize },
    #[error("oracle process was terminated without an exit code")]
    NoExitCode,
}

/// What the oracle actually said when it accepted a guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofBody {
    /// Local process: the exit code plus everything it printed.
    ExitStatus {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// Remote socket: the full response text.
    Response { body: String },
}

/// Evidence attached to a [`Verdict::Correct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    body: ProofBody,
    observed_at: SystemTime,
}

impl Proof {
    #[must_use]
    pub fn exit_status(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            body: ProofBody::ExitStatus {
                code,
                stdout: stdout.into(),
                stderr: stderr.into(),
            },
            observed_at: SystemTime::now(),
        }
    }

    #[must_use]
    pub fn response(body: impl Into<String>) -> Self {
        Self {
            body: ProofBody::Response { body: body.into() },
            observed_at: SystemTime::now(),
        }
    }

    #[must_use]
    pub const fn body(&self) -> &ProofBody {
        &self.body
    }

    #[must_use]
    pub const fn observed_at(&self) -> SystemTime {
        self.observed_at
    }

    /// The text the oracle produced, stdout and stderr joined for process proofs.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.body {
            ProofBody::ExitStatus { stdout, stderr, .. } => {
                let mut out = stdout.trim_end().to_string();
                if !stderr.trim().is_empty() {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(stderr.trim_end());
                }
                out
            }
            ProofBody::Response { body } => body.trim_end().to_string(),
        }
    }
}
