//! oracle-probe - binary-search a hidden integer through an oracle.
//!
//! ```text
//! oracle-probe [local]
//! ```
//!
//! `local` runs the configured executable once per guess and reads its exit
//! status. Anything else (or no argument) talks to the configured TCP oracle.
//! The answer goes to stdout; logs go to stderr, or to the file named by
//! `ORACLE_PROBE_LOG_FILE`.

mod report;

use anyhow::{Context, Result};
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Write, stdout},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use oracle_config::OracleConfig;
use oracle_search::CancelFlag;
use oracle_transport::TransportMode;

const LOG_FILE_ENV: &str = "ORACLE_PROBE_LOG_FILE";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        return;
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(path) = env::var_os(LOG_FILE_ENV).map(PathBuf::from) else {
        return (None, warnings);
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warnings.push(format!(
            "Failed to create log dir {}: {e}",
            parent.display()
        ));
        return (None, warnings);
    }

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => (Some((path, file)), warnings),
        Err(e) => {
            warnings.push(format!("Failed to open log file {}: {e}", path.display()));
            (None, warnings)
        }
    }
}

/// Set `cancel` on Ctrl-C. The query in flight finishes first.
fn spawn_interrupt_watcher(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping after the current query");
            cancel.cancel();
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let mode = TransportMode::from_arg(env::args().nth(1).as_deref());
    let config = OracleConfig::load().with_context(|| match OracleConfig::path() {
        Some(path) => format!("failed to load config from {}", path.display()),
        None => "failed to load config".to_string(),
    })?;
    tracing::info!(
        mode = mode.as_str(),
        domain = %config.search.domain,
        "Configuration loaded"
    );

    let cancel = CancelFlag::new();
    spawn_interrupt_watcher(cancel.clone());

    let outcome = oracle_search::run(mode, &config, cancel).await;

    let mut out = stdout().lock();
    match outcome {
        Ok(solution) => {
            out.write_all(report::solved(&solution).as_bytes())
                .context("failed to write result")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            out.write_all(report::failed(&err).as_bytes())
                .context("failed to write result")?;
            Ok(ExitCode::FAILURE)
        }
    }
}
