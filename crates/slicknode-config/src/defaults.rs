use crate::logging::LogFormat;

/// Maximum tolerated difference, in seconds, between a request timestamp
/// and the local clock.
pub const DEFAULT_MAX_CLOCK_DRIFT: u64 = 120;

/// Default log filter expression used by the runtime and its worker.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Name of the environment variable consulted when no secret is configured.
pub const SECRET_ENV_VAR: &str = "SLICKNODE_SECRET";

/// File name of the isolated execution worker binary.
pub const WORKER_BINARY_NAME: &str = "slicknode-worker";

/// Default clock drift, for serde defaults.
#[must_use]
pub const fn default_max_clock_drift() -> u64 {
    DEFAULT_MAX_CLOCK_DRIFT
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
