//! Request authentication.
//!
//! The [`Authenticator`] checks, in order: the `Authorization` header is
//! present, the timestamp header is present, the timestamp is within the
//! allowed clock drift, the `Authorization` value follows the signature
//! scheme, and the signature matches. When no secret is configured, neither
//! explicitly nor through `SLICKNODE_SECRET`, authentication is skipped and
//! a warning is logged.

use std::env;
use std::sync::Arc;

use slicknode_config::{DEFAULT_MAX_CLOCK_DRIFT, SECRET_ENV_VAR};
use tracing::warn;

use crate::error::AuthError;
use crate::headers::Headers;
use crate::options::RuntimeOptions;
use crate::signature::{self, AUTHORIZATION_HEADER, TIMESTAMP_HEADER};

/// Tracing target for authentication events.
const AUTH_TARGET: &str = "slicknode_runtime::auth";

/// Source of wall-clock time in unix seconds.
pub trait Clock: Send + Sync {
    /// Returns the current unix time in seconds.
    fn now_unix(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        signature::current_timestamp()
    }
}

/// Validates signed requests against a shared secret.
#[derive(Clone)]
pub struct Authenticator {
    secret: Option<String>,
    max_clock_drift: u64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("max_clock_drift", &self.max_clock_drift)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Creates an authenticator using the system clock.
    #[must_use]
    pub fn new(secret: Option<String>, max_clock_drift: u64) -> Self {
        Self {
            secret,
            max_clock_drift,
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates an authenticator from runtime options.
    #[must_use]
    pub fn from_options(options: &RuntimeOptions) -> Self {
        Self::new(
            options.secret().map(ToOwned::to_owned),
            options.max_clock_drift(),
        )
    }

    /// Replaces the clock used for drift checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the maximum allowed clock drift in seconds.
    #[must_use]
    pub const fn max_clock_drift(&self) -> u64 {
        self.max_clock_drift
    }

    /// Authenticates a raw request body and its headers.
    ///
    /// # Errors
    ///
    /// Returns the first [`AuthError`] encountered in the check sequence.
    pub fn authenticate(&self, body: &[u8], headers: &Headers) -> Result<(), AuthError> {
        let Some(secret) = self.resolve_secret() else {
            warn!(
                target: AUTH_TARGET,
                env_var = SECRET_ENV_VAR,
                "no secret set in runtime; authorization is skipped and the server is insecure"
            );
            return Ok(());
        };

        let authorization = headers
            .get_unique(AUTHORIZATION_HEADER)?
            .ok_or(AuthError::MissingAuthorization)?;
        let raw_timestamp = headers
            .get_unique(TIMESTAMP_HEADER)?
            .ok_or(AuthError::MissingTimestamp)?;
        let timestamp = self.check_timestamp(raw_timestamp)?;
        let provided =
            signature::parse_authorization(authorization).ok_or(AuthError::InvalidFormat)?;

        if signature::verify(&secret, timestamp, body, provided) {
            Ok(())
        } else {
            Err(AuthError::SignatureMismatch)
        }
    }

    fn resolve_secret(&self) -> Option<String> {
        self.secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .or_else(|| env::var(SECRET_ENV_VAR).ok().filter(|secret| !secret.is_empty()))
    }

    fn check_timestamp(&self, raw: &str) -> Result<i64, AuthError> {
        let drift_error = AuthError::ClockDrift {
            max_clock_drift: self.max_clock_drift,
        };
        let timestamp = raw.trim().parse::<i64>().map_err(|_| drift_error.clone())?;
        if self.clock.now_unix().abs_diff(timestamp) > self.max_clock_drift {
            return Err(drift_error);
        }
        Ok(timestamp)
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_CLOCK_DRIFT)
    }
}
