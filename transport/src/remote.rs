//! Remote line-oriented oracle.
//!
//! One TCP connection per guess: connect, read and discard the prompt up to
//! the delimiter, send `"<n>\n"`, read until the server closes. A single
//! deadline covers the whole exchange. The socket is owned by the query
//! future and is closed on every return path.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use oracle_config::RemoteSettings;
use oracle_types::{Candidate, IndeterminateReason, Proof, Verdict};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};

use crate::policy::{Classification, MarkerPolicy};
use crate::{OracleTransport, QueryFut, TransportError};

/// Upper bound on prompt and response sizes.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

const READ_CHUNK_BYTES: usize = 4096;

pub struct RemoteSocketTransport {
    host: String,
    port: u16,
    addrs: Vec<SocketAddr>,
    timeout: Duration,
    prompt_delimiter: Vec<u8>,
    policy: MarkerPolicy,
}

impl RemoteSocketTransport {
    /// Resolve the oracle host once. Resolution failure is fatal for the search.
    pub async fn resolve(settings: &RemoteSettings) -> Result<Self, TransportError> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((settings.host.as_str(), settings.port))
            .await
            .map_err(|source| TransportError::Resolve {
                host: settings.host.clone(),
                port: settings.port,
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::NoAddresses {
                host: settings.host.clone(),
                port: settings.port,
            });
        }
        tracing::debug!(host = %settings.host, port = settings.port, ?addrs, "Resolved remote oracle");

        Ok(Self {
            host: settings.host.clone(),
            port: settings.port,
            addrs,
            timeout: settings.timeout,
            prompt_delimiter: settings.prompt_delimiter.as_bytes().to_vec(),
            policy: MarkerPolicy::from(settings),
        })
    }

    #[must_use]
    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    async fn exchange(&self, candidate: Candidate) -> Verdict {
        let deadline = Instant::now() + self.timeout;
        let timed_out = || {
            Verdict::Indeterminate(IndeterminateReason::Timeout {
                after: self.timeout,
            })
        };

        let mut stream = match timeout_at(deadline, TcpStream::connect(&self.addrs[..])).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::warn!(host = %self.host, port = self.port, "Connection failed: {e}");
                return Verdict::Indeterminate(IndeterminateReason::Connect(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(host = %self.host, port = self.port, "Connection timed out");
                return timed_out();
            }
        };
        tracing::debug!(candidate = %candidate, "Connected to remote oracle");

        match timeout_at(deadline, skip_prompt(&mut stream, &self.prompt_delimiter)).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                return Verdict::Indeterminate(IndeterminateReason::PromptNotReceived);
            }
            Ok(Err(e)) => return Verdict::Indeterminate(IndeterminateReason::Io(e.to_string())),
            Err(_) => return timed_out(),
        }

        let line = candidate.encode_line();
        match timeout_at(deadline, stream.write_all(line.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Verdict::Indeterminate(IndeterminateReason::Io(e.to_string())),
            Err(_) => return timed_out(),
        }

        // `body` lives outside the timed future so bytes received before the
        // deadline survive it.
        let mut body = Vec::new();
        let read = timeout_at(deadline, read_response(&mut stream, &mut body)).await;
        let text = String::from_utf8_lossy(&body);

        match read {
            Ok(Ok(())) => match self.policy.classify(&text) {
                Some(classification) => self.finish(candidate, classification, &text),
                None => {
                    tracing::warn!(candidate = %candidate, "Empty response from oracle");
                    Verdict::Indeterminate(IndeterminateReason::EmptyResponse)
                }
            },
            Ok(Err(e)) => match self.policy.find_marker(&text) {
                Some(classification) => self.finish(candidate, classification, &text),
                None => Verdict::Indeterminate(IndeterminateReason::Io(e.to_string())),
            },
            Err(_) => match self.policy.find_marker(&text) {
                Some(classification) => self.finish(candidate, classification, &text),
                None if text.trim().is_empty() => timed_out(),
                None => {
                    tracing::warn!(
                        candidate = %candidate,
                        bytes = body.len(),
                        "Response cut off by deadline without a verdict marker"
                    );
                    Verdict::Indeterminate(IndeterminateReason::TruncatedResponse {
                        bytes: body.len(),
                    })
                }
            },
        }
    }

    fn finish(&self, candidate: Candidate, classification: Classification, text: &str) -> Verdict {
        match classification {
            Classification::TooLow => Verdict::TooLow,
            Classification::TooHigh => Verdict::TooHigh,
            Classification::Accepted => {
                tracing::info!(candidate = %candidate, response = %text.trim(), "Oracle accepted guess");
                Verdict::Correct(Proof::response(text))
            }
        }
    }
}

impl OracleTransport for RemoteSocketTransport {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn query(&mut self, candidate: Candidate) -> QueryFut<'_> {
        Box::pin(self.exchange(candidate))
    }
}

/// Read until `delimiter` has been seen. Returns `false` on EOF first.
async fn skip_prompt<R: AsyncRead + Unpin>(reader: &mut R, delimiter: &[u8]) -> io::Result<bool> {
    let mut seen = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(false);
        }
        seen.extend_from_slice(&chunk[..n]);
        if seen.windows(delimiter.len()).any(|w| w == delimiter) {
            return Ok(true);
        }
        if seen.len() > MAX_RESPONSE_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("prompt exceeded {MAX_RESPONSE_BYTES} bytes without delimiter"),
            ));
        }
    }
}

/// Append everything until EOF (or the size cap) to `body`.
async fn read_response<R: AsyncRead + Unpin>(reader: &mut R, body: &mut Vec<u8>) -> io::Result<()> {
    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        let room = MAX_RESPONSE_BYTES.saturating_sub(body.len());
        body.extend_from_slice(&chunk[..n.min(room)]);
        if body.len() >= MAX_RESPONSE_BYTES {
            tracing::debug!("Response reached {MAX_RESPONSE_BYTES} bytes; truncating");
            return Ok(());
        }
    }
}
