//! Structured telemetry initialisation.
//!
//! Logs always go to stderr. The worker binary relies on this: its stdout
//! carries the protocol response and nothing else.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use slicknode_config::{Config, LogFormat};
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync>;

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Events are written to stderr as flattened JSON or compact text, filtered
/// by `log_filter`. Colour is only used for compact output on a terminal.
/// Later calls return a fresh [`TelemetryHandle`] without touching the
/// global state.
///
/// # Examples
///
/// ```rust
/// use slicknode_config::Config;
/// use slicknode_runtime::telemetry;
///
/// # fn main() -> Result<(), slicknode_runtime::telemetry::TelemetryError> {
/// let config = Config::default();
/// let first = telemetry::initialise(&config)?;
/// let second = telemetry::initialise(&config)?;
/// drop(first);
/// drop(second);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns a [`TelemetryError`] if the filter expression is invalid or
/// another global subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let subscriber = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}

/// Builds the stderr subscriber described by `config` without installing it.
fn build_subscriber(config: &Config) -> Result<BoxedSubscriber, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let ansi = config.log_format() == LogFormat::Compact && io::stderr().is_terminal();
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn config_with(log_filter: &str, log_format: LogFormat) -> Config {
        Config {
            log_filter: log_filter.to_owned(),
            log_format,
            ..Config::default()
        }
    }

    #[test]
    fn rejects_invalid_filter() {
        let config = config_with("slicknode=notalevel", LogFormat::Json);
        assert!(matches!(
            build_subscriber(&config),
            Err(TelemetryError::Filter(_))
        ));
    }

    #[rstest]
    #[case::json(LogFormat::Json)]
    #[case::compact(LogFormat::Compact)]
    fn builds_subscriber_for_each_format(#[case] format: LogFormat) {
        let config = config_with("slicknode_runtime=debug", format);
        let subscriber = build_subscriber(&config).expect("valid configuration");
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "slicknode_runtime::executor", "probe");
        });
    }
}
