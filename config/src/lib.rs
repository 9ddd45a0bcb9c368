//! Configuration loading and validation for oracle search.
//!
//! The file is optional. Every field has a default, so a missing file (or a
//! missing section) runs against the stock `pickanumber` oracle.
//!
//! ```toml
//! [search]
//! domain_low = 1
//! domain_high = 10000000
//! retry_limit = 5
//! retry_backoff_ms = 1000
//! retry_max_backoff_ms = 1000
//! retry_jitter = 0.0
//!
//! [local]
//! exec_path = "./pickanumber"
//! timeout_ms = 2000
//! too_low_code = 9
//! too_high_code = 10
//!
//! [remote]
//! host = "vacr.io"
//! port = 5277
//! timeout_ms = 3000
//! prompt_delimiter = ":"
//! too_low_marker = "Too low"
//! too_high_marker = "Too high"
//! ```
//!
//! String fields accept `${VAR}` environment references.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use oracle_types::SearchInterval;
use serde::Deserialize;
use thiserror::Error;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ORACLE_PROBE_CONFIG";

const DEFAULT_DOMAIN_LOW: i64 = 1;
const DEFAULT_DOMAIN_HIGH: i64 = 10_000_000;
const DEFAULT_RETRY_LIMIT: u32 = 5;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;
const DEFAULT_LOCAL_EXEC_PATH: &str = "./pickanumber";
const DEFAULT_LOCAL_TIMEOUT_MS: u64 = 2_000;
// Observed against one `pickanumber` build; other oracles will differ.
const DEFAULT_TOO_LOW_CODE: i32 = 9;
const DEFAULT_TOO_HIGH_CODE: i32 = 10;
const DEFAULT_REMOTE_HOST: &str = "vacr.io";
const DEFAULT_REMOTE_PORT: u16 = 5277;
const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_PROMPT_DELIMITER: &str = ":";
const DEFAULT_TOO_LOW_MARKER: &str = "Too low";
const DEFAULT_TOO_HIGH_MARKER: &str = "Too high";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

// ============================================================================
// File format
// ============================================================================

/// On-disk shape. Everything is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub search: Option<SearchSection>,
    pub local: Option<LocalSection>,
    pub remote: Option<RemoteSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    pub domain_low: Option<i64>,
    pub domain_high: Option<i64>,
    /// Indeterminate attempts tolerated on one midpoint before giving up.
    pub retry_limit: Option<u32>,
    /// Delay before the first retry of a midpoint.
    pub retry_backoff_ms: Option<u64>,
    /// Cap for the doubling delay. Defaults to `retry_backoff_ms` (fixed delay).
    pub retry_max_backoff_ms: Option<u64>,
    /// Down-jitter fraction in `[0, 1]`. Default: 0.
    pub retry_jitter: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocalSection {
    pub exec_path: Option<String>,
    pub timeout_ms: Option<u64>,
    pub too_low_code: Option<i32>,
    pub too_high_code: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoteSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_ms: Option<u64>,
    pub prompt_delimiter: Option<String>,
    pub too_low_marker: Option<String>,
    pub too_high_marker: Option<String>,
}

// ============================================================================
// Resolved settings
// ============================================================================

/// Validated configuration handed to the transports and the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    pub search: SearchSettings,
    pub local: LocalSettings,
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub domain: SearchInterval,
    pub retry_limit: u32,
    pub retry_backoff: Duration,
    pub retry_max_backoff: Duration,
    pub retry_jitter: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    pub exec_path: PathBuf,
    pub timeout: Duration,
    pub too_low_code: i32,
    pub too_high_code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub prompt_delimiter: String,
    pub too_low_marker: String,
    pub too_high_marker: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        RawConfig::default()
            .resolve()
            .expect("built-in defaults are valid")
    }
}

impl OracleConfig {
    /// Load from `$ORACLE_PROBE_CONFIG` or `~/.oracle-probe/config.toml`.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read or parsed is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = config_path() else {
            tracing::debug!("No home directory; using default config");
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found; using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let raw: RawConfig = match toml::from_str(&content) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                return Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        let config = raw.resolve()?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

impl RawConfig {
    /// Apply defaults, expand `${VAR}` references, and validate.
    pub fn resolve(self) -> Result<OracleConfig, ConfigError> {
        let search = resolve_search(self.search.unwrap_or_default())?;
        let local = resolve_local(self.local.unwrap_or_default())?;
        let remote = resolve_remote(self.remote.unwrap_or_default())?;
        Ok(OracleConfig {
            search,
            local,
            remote,
        })
    }
}

fn resolve_search(section: SearchSection) -> Result<SearchSettings, ConfigError> {
    let low = section.domain_low.unwrap_or(DEFAULT_DOMAIN_LOW);
    let high = section.domain_high.unwrap_or(DEFAULT_DOMAIN_HIGH);
    let domain = SearchInterval::new(low, high)
        .map_err(|e| ConfigError::invalid("search.domain_low", e.to_string()))?;

    let retry_limit = section.retry_limit.unwrap_or(DEFAULT_RETRY_LIMIT);
    if retry_limit == 0 {
        return Err(ConfigError::invalid(
            "search.retry_limit",
            "must allow at least one attempt",
        ));
    }

    let backoff_ms = section.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS);
    let max_backoff_ms = section.retry_max_backoff_ms.unwrap_or(backoff_ms);
    if max_backoff_ms < backoff_ms {
        return Err(ConfigError::invalid(
            "search.retry_max_backoff_ms",
            format!("{max_backoff_ms} is below retry_backoff_ms ({backoff_ms})"),
        ));
    }

    let retry_jitter = section.retry_jitter.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&retry_jitter) {
        return Err(ConfigError::invalid(
            "search.retry_jitter",
            format!("{retry_jitter} is outside [0, 1]"),
        ));
    }

    Ok(SearchSettings {
        domain,
        retry_limit,
        retry_backoff: Duration::from_millis(backoff_ms),
        retry_max_backoff: Duration::from_millis(max_backoff_ms),
        retry_jitter,
    })
}

fn resolve_local(section: LocalSection) -> Result<LocalSettings, ConfigError> {
    let exec_path = section
        .exec_path
        .as_deref()
        .map_or_else(|| DEFAULT_LOCAL_EXEC_PATH.to_string(), expand_env_vars);
    if exec_path.trim().is_empty() {
        return Err(ConfigError::invalid("local.exec_path", "must not be empty"));
    }

    let timeout = positive_millis(
        "local.timeout_ms",
        section.timeout_ms.unwrap_or(DEFAULT_LOCAL_TIMEOUT_MS),
    )?;

    let too_low_code = section.too_low_code.unwrap_or(DEFAULT_TOO_LOW_CODE);
    let too_high_code = section.too_high_code.unwrap_or(DEFAULT_TOO_HIGH_CODE);
    if too_low_code == too_high_code {
        return Err(ConfigError::invalid(
            "local.too_high_code",
            format!("must differ from too_low_code ({too_low_code})"),
        ));
    }

    Ok(LocalSettings {
        exec_path: PathBuf::from(exec_path),
        timeout,
        too_low_code,
        too_high_code,
    })
}

fn resolve_remote(section: RemoteSection) -> Result<RemoteSettings, ConfigError> {
    let host = section
        .host
        .as_deref()
        .map_or_else(|| DEFAULT_REMOTE_HOST.to_string(), expand_env_vars);
    if host.trim().is_empty() {
        return Err(ConfigError::invalid("remote.host", "must not be empty"));
    }

    let port = section.port.unwrap_or(DEFAULT_REMOTE_PORT);
    if port == 0 {
        return Err(ConfigError::invalid("remote.port", "must not be 0"));
    }

    let timeout = positive_millis(
        "remote.timeout_ms",
        section.timeout_ms.unwrap_or(DEFAULT_REMOTE_TIMEOUT_MS),
    )?;

    let prompt_delimiter = section
        .prompt_delimiter
        .unwrap_or_else(|| DEFAULT_PROMPT_DELIMITER.to_string());
    if prompt_delimiter.is_empty() {
        return Err(ConfigError::invalid(
            "remote.prompt_delimiter",
            "must not be empty",
        ));
    }

    let too_low_marker = section
        .too_low_marker
        .as_deref()
        .map_or_else(|| DEFAULT_TOO_LOW_MARKER.to_string(), expand_env_vars);
    let too_high_marker = section
        .too_high_marker
        .as_deref()
        .map_or_else(|| DEFAULT_TOO_HIGH_MARKER.to_string(), expand_env_vars);
    if too_low_marker.is_empty() {
        return Err(ConfigError::invalid(
            "remote.too_low_marker",
            "must not be empty",
        ));
    }
    if too_high_marker.is_empty() {
        return Err(ConfigError::invalid(
            "remote.too_high_marker",
            "must not be empty",
        ));
    }
    if too_low_marker == too_high_marker {
        return Err(ConfigError::invalid(
            "remote.too_high_marker",
            "must differ from too_low_marker",
        ));
    }

    Ok(RemoteSettings {
        host,
        port,
        timeout,
        prompt_delimiter,
        too_low_marker,
        too_high_marker,
    })
}

fn positive_millis(field: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0"));
    }
    Ok(Duration::from_millis(ms))
}

/// Replace `${VAR}` with the variable's value. Unset variables become empty;
/// an unclosed `${` is left as-is.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".oracle-probe").join("config.toml"))
}
