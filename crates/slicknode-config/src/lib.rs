//! Shared configuration for the Slicknode function runtime.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, configuration
//! files, `SLICKNODE_*` environment variables and command-line flags, with
//! later layers taking precedence. The runtime library converts it into
//! its own option type; the worker binary uses it to set up logging.

mod defaults;
mod logging;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_CLOCK_DRIFT, SECRET_ENV_VAR, WORKER_BINARY_NAME,
    default_log_filter_string, default_log_format, default_max_clock_drift,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SLICKNODE")]
pub struct Config {
    /// Shared HMAC secret. When unset, [`SECRET_ENV_VAR`] is consulted at
    /// authentication time; when that is unset too, authentication is
    /// skipped.
    #[serde(default)]
    pub secret: Option<String>,

    /// Maximum allowed clock drift in seconds.
    #[ortho_config(default = DEFAULT_MAX_CLOCK_DRIFT)]
    #[serde(default = "default_max_clock_drift")]
    pub max_clock_drift: u64,

    /// Executes every handler in a fresh worker process.
    #[ortho_config(default = false)]
    #[serde(default)]
    pub isolated: bool,

    /// Worker executable used when `isolated` is set.
    #[serde(default)]
    pub worker_program: Option<Utf8PathBuf>,

    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,

    /// Log output format.
    #[ortho_config(default = default_log_format())]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Config {
    /// Returns the configured secret, treating an empty string as unset.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|secret| !secret.is_empty())
    }

    /// Returns the maximum allowed clock drift in seconds.
    #[must_use]
    pub const fn max_clock_drift(&self) -> u64 {
        self.max_clock_drift
    }

    /// Returns whether handlers run in isolated worker processes.
    #[must_use]
    pub const fn isolated(&self) -> bool {
        self.isolated
    }

    /// Returns the configured worker executable, if any.
    #[must_use]
    pub fn worker_program(&self) -> Option<&camino::Utf8Path> {
        self.worker_program.as_deref()
    }

    /// Returns the log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret: None,
            max_clock_drift: DEFAULT_MAX_CLOCK_DRIFT,
            isolated: false,
            worker_program: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}
