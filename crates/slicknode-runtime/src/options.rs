//! Runtime options consumed by the executor.

use std::path::{Path, PathBuf};

use slicknode_config::{Config, DEFAULT_MAX_CLOCK_DRIFT};

/// Settings that shape authentication and the handler loading strategy.
///
/// # Example
///
/// ```
/// use slicknode_runtime::RuntimeOptions;
///
/// let options = RuntimeOptions::new()
///     .with_secret("somesecret")
///     .with_max_clock_drift(200);
/// assert_eq!(options.max_clock_drift(), 200);
/// assert!(!options.isolated());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    secret: Option<String>,
    max_clock_drift: u64,
    isolated: bool,
    worker_program: Option<PathBuf>,
}

impl RuntimeOptions {
    /// Creates options with the default clock drift and direct loading.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            secret: None,
            max_clock_drift: DEFAULT_MAX_CLOCK_DRIFT,
            isolated: false,
            worker_program: None,
        }
    }

    /// Derives options from the layered configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            secret: config.secret().map(ToOwned::to_owned),
            max_clock_drift: config.max_clock_drift(),
            isolated: config.isolated(),
            worker_program: config
                .worker_program()
                .map(|path| path.as_std_path().to_path_buf()),
        }
    }

    /// Sets the shared signing secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the maximum allowed clock drift in seconds.
    #[must_use]
    pub const fn with_max_clock_drift(mut self, seconds: u64) -> Self {
        self.max_clock_drift = seconds;
        self
    }

    /// Selects isolated (per-call worker) or direct handler execution.
    #[must_use]
    pub const fn with_isolation(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    /// Sets the worker executable used by isolated execution.
    #[must_use]
    pub fn with_worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }

    /// Returns the explicitly configured secret.
    #[must_use]
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Returns the maximum allowed clock drift in seconds.
    #[must_use]
    pub const fn max_clock_drift(&self) -> u64 {
        self.max_clock_drift
    }

    /// Returns whether handlers run in isolated workers.
    #[must_use]
    pub const fn isolated(&self) -> bool {
        self.isolated
    }

    /// Returns the configured worker executable.
    #[must_use]
    pub fn worker_program(&self) -> Option<&Path> {
        self.worker_program.as_deref()
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self::new()
    }
}
