//! Service configuration from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HEARTGUARD_MODELS_DIR` | `models` |
//! | `HEARTGUARD_BIND_ADDR` | `0.0.0.0:8000` |
//! | `HEARTGUARD_ALLOWED_ORIGINS` | `http://localhost:3000,http://127.0.0.1:3000` |
//! | `HEARTGUARD_LOG_MODE` | `stdout` (or `file`) |
//! | `HEARTGUARD_LOG_FILE` | `heartguard.log` |

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;

pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];
pub const DEFAULT_LOG_FILE: &str = "heartguard.log";

/// Error type for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HEARTGUARD_BIND_ADDR {value:?} is not a socket address: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("HEARTGUARD_ALLOWED_ORIGINS entry {0:?} is not a valid header value")]
    Origin(String),

    #[error("HEARTGUARD_LOG_MODE {0:?} is not one of stdout, file")]
    LogMode(String),
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub models_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub allowed_origins: Vec<HeaderValue>,
    pub log: LogTarget,
}

impl ServiceConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset and blank values take the
    /// default.
    ///
    /// # Errors
    /// Returns error if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let models_dir = get("HEARTGUARD_MODELS_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR), PathBuf::from);

        let bind_value =
            get("HEARTGUARD_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_value
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                value: bind_value.clone(),
                source,
            })?;

        let allowed_origins = match get("HEARTGUARD_ALLOWED_ORIGINS") {
            Some(list) => parse_origins(list.split(','))?,
            None => parse_origins(DEFAULT_ALLOWED_ORIGINS)?,
        };

        let log = match get("HEARTGUARD_LOG_MODE").as_deref() {
            None | Some("stdout") => LogTarget::Stdout,
            Some("file") => LogTarget::File(
                get("HEARTGUARD_LOG_FILE")
                    .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from),
            ),
            Some(other) => return Err(ConfigError::LogMode(other.to_string())),
        };

        Ok(Self {
            models_dir,
            bind_addr,
            allowed_origins,
            log,
        })
    }
}

fn parse_origins<'a>(
    origins: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<HeaderValue>, ConfigError> {
    origins
        .into_iter()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| HeaderValue::from_str(o).map_err(|_| ConfigError::Origin(o.to_string())))
        .collect()
}
