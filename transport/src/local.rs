//! Local process oracle.
//!
//! The oracle answers through its exit status, so every guess is one run of
//! the executable: spawn, write `"<n>\n"` to stdin, close stdin, wait. What
//! persists across the search is the resolved executable and the exclusive
//! `&mut` access; each child is reaped (or killed) before `query` returns.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use oracle_config::LocalSettings;
use oracle_types::{Candidate, IndeterminateReason, Proof, Verdict};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::task::JoinHandle;

use crate::policy::{Classification, ExitCodePolicy};
use crate::{OracleTransport, QueryFut, TransportError};

/// Maximum bytes kept per output stream. Anything beyond is drained and dropped.
const MAX_OUTPUT_BYTES: u64 = 64 * 1024;

/// How long to wait for stdout/stderr to reach EOF after the process exits.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

pub struct LocalProcessTransport {
    program: PathBuf,
    timeout: Duration,
    policy: ExitCodePolicy,
}

impl LocalProcessTransport {
    pub fn new(settings: &LocalSettings) -> Result<Self, TransportError> {
        Self::with_policy(
            &settings.exec_path,
            settings.timeout,
            ExitCodePolicy::from(settings),
        )
    }

    /// Resolve `program` now so a missing or non-executable oracle fails the
    /// whole search before the first probe.
    pub fn with_policy(
        program: &Path,
        timeout: Duration,
        policy: ExitCodePolicy,
    ) -> Result<Self, TransportError> {
        let resolved = which::which(program).map_err(|source| TransportError::Executable {
            path: program.to_path_buf(),
            source,
        })?;
        tracing::debug!(program = %resolved.display(), "Resolved local oracle");
        Ok(Self {
            program: resolved,
            timeout,
            policy,
        })
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run_once(&self, candidate: Candidate) -> Verdict {
        let mut command = Command::new(&self.program);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(candidate = %candidate, "Failed to spawn oracle: {e}");
                return Verdict::Indeterminate(IndeterminateReason::Spawn(e.to_string()));
            }
        };

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Verdict::Indeterminate(IndeterminateReason::Io(
                "oracle stdio was not captured".to_string(),
            ));
        };

        let stdout_task = tokio::spawn(read_capped(stdout));
        let stderr_task = tokio::spawn(read_capped(stderr));

        let line = candidate.encode_line();
        let exchange = tokio::time::timeout(self.timeout, async {
            feed_stdin(stdin, &line).await?;
            child.wait().await
        })
        .await;

        let status = match exchange {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                tracing::warn!(candidate = %candidate, "Oracle process I/O failed: {e}");
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Verdict::Indeterminate(IndeterminateReason::Io(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    candidate = %candidate,
                    timeout_ms = self.timeout.as_millis(),
                    "Oracle process timed out"
                );
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Verdict::Indeterminate(IndeterminateReason::Timeout {
                    after: self.timeout,
                });
            }
        };

        let Some(code) = status.code() else {
            tracing::warn!(candidate = %candidate, %status, "Oracle exited without a code");
            stdout_task.abort();
            stderr_task.abort();
            return Verdict::Indeterminate(IndeterminateReason::NoExitCode);
        };
        tracing::info!(candidate = %candidate, exit_code = code, "Oracle exited");

        match self.policy.classify(code) {
            Classification::TooLow => {
                stdout_task.abort();
                stderr_task.abort();
                Verdict::TooLow
            }
            Classification::TooHigh => {
                stdout_task.abort();
                stderr_task.abort();
                Verdict::TooHigh
            }
            Classification::Accepted => {
                let stdout = match collect_output(stdout_task).await {
                    Ok(text) => text,
                    Err(reason) => return Verdict::Indeterminate(reason),
                };
                let stderr = match collect_output(stderr_task).await {
                    Ok(text) => text,
                    Err(reason) => return Verdict::Indeterminate(reason),
                };
                Verdict::Correct(Proof::exit_status(code, stdout, stderr))
            }
        }
    }
}

impl OracleTransport for LocalProcessTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    fn query(&mut self, candidate: Candidate) -> QueryFut<'_> {
        Box::pin(self.run_once(candidate))
    }
}

/// Write the guess and close stdin. An oracle that exits without reading
/// leaves a broken pipe behind; its exit status still decides the verdict.
async fn feed_stdin(mut stdin: ChildStdin, line: &str) -> io::Result<()> {
    match stdin.write_all(line.as_bytes()).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!("Oracle closed stdin before reading the guess");
            return Ok(());
        }
        Err(e) => return Err(e),
    }
    match stdin.shutdown().await {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}

async fn read_capped<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<String> {
    let mut buf = Vec::new();
    (&mut reader)
        .take(MAX_OUTPUT_BYTES)
        .read_to_end(&mut buf)
        .await?;
    // Keep draining so the child never blocks on a full pipe.
    tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn collect_output(
    task: JoinHandle<io::Result<String>>,
) -> Result<String, IndeterminateReason> {
    match tokio::time::timeout(OUTPUT_DRAIN_GRACE, task).await {
        Ok(Ok(Ok(text))) => Ok(text),
        Ok(Ok(Err(e))) => Err(IndeterminateReason::Io(e.to_string())),
        Ok(Err(e)) => Err(IndeterminateReason::Io(e.to_string())),
        Err(_) => Err(IndeterminateReason::Io(
            "oracle output did not close after exit".to_string(),
        )),
    }
}
