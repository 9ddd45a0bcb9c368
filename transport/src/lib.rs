//! Oracle transports.
//!
//! A transport turns a [`Candidate`] into a classified [`Verdict`], hiding how
//! the oracle is reached:
//!
//! - [`LocalProcessTransport`]: runs a local executable, writes the guess to its
//!   stdin and classifies its exit status.
//! - [`RemoteSocketTransport`]: opens a TCP connection per guess, answers the
//!   prompt and classifies the free-text reply.
//!
//! Construction is where fatal problems surface (missing executable, host that
//! does not resolve). Once built, `query` never fails: anything that goes wrong
//! mid-query comes back as [`Verdict::Indeterminate`].

pub mod local;
pub mod policy;
pub mod remote;

pub use local::LocalProcessTransport;
pub use policy::{Classification, ExitCodePolicy, MarkerPolicy};
pub use remote::RemoteSocketTransport;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;

use oracle_config::OracleConfig;
use oracle_types::{Candidate, Verdict};
use thiserror::Error;

/// Query future type alias.
pub type QueryFut<'a> = Pin<Box<dyn Future<Output = Verdict> + Send + 'a>>;

/// Capability shared by every way of reaching an oracle.
///
/// `query` takes `&mut self`: a transport answers one guess at a time, and the
/// borrow checker enforces that no two probes overlap on the same instance.
pub trait OracleTransport: Send {
    /// Short label for logs ("local", "remote").
    fn name(&self) -> &'static str;

    fn query(&mut self, candidate: Candidate) -> QueryFut<'_>;
}

impl<T: OracleTransport + ?Sized> OracleTransport for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn query(&mut self, candidate: Candidate) -> QueryFut<'_> {
        (**self).query(candidate)
    }
}

/// Fatal transport construction failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("oracle executable {} is not runnable: {source}", path.display())]
    Executable {
        path: PathBuf,
        #[source]
        source: which::Error,
    },
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("{host}:{port} resolved to no addresses")]
    NoAddresses { host: String, port: u16 },
}

/// Which transport the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Local,
    Remote,
}

impl TransportMode {
    /// `local` selects the process transport; anything else (or nothing) is remote.
    #[must_use]
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("local") => TransportMode::Local,
            _ => TransportMode::Remote,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransportMode::Local => "local",
            TransportMode::Remote => "remote",
        }
    }
}

/// Build the transport for `mode` once, up front.
pub async fn connect(
    mode: TransportMode,
    config: &OracleConfig,
) -> Result<Box<dyn OracleTransport>, TransportError> {
    match mode {
        TransportMode::Local => {
            let transport = LocalProcessTransport::new(&config.local)?;
            Ok(Box::new(transport))
        }
        TransportMode::Remote => {
            let transport = RemoteSocketTransport::resolve(&config.remote).await?;
            Ok(Box::new(transport))
        }
    }
}
