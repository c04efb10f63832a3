//! Error taxonomy for request execution.
//!
//! Every failure a request can run into maps onto one [`RuntimeError`]
//! variant, whose `Display` output is exactly the message placed in the
//! response envelope. [`WorkerError`] is the exception: it describes a
//! breakdown of the isolation mechanism itself and is returned to the caller
//! instead of being folded into a response. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Reasons a request fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The request carried no `Authorization` header.
    #[error("No authorization header found")]
    MissingAuthorization,

    /// The request carried no timestamp header.
    #[error("Header x-slicknode-timestamp is missing")]
    MissingTimestamp,

    /// The timestamp is not an integer or lies outside the allowed drift.
    #[error(
        "The difference of the timestamp for the signature and the local server time exceed \
         the maximum allowed clock drift of {max_clock_drift} seconds"
    )]
    ClockDrift {
        /// Configured maximum drift in seconds.
        max_clock_drift: u64,
    },

    /// The `Authorization` value does not follow the signature scheme.
    #[error("Invalid authorization header format")]
    InvalidFormat,

    /// The signature does not match the one computed for the request.
    #[error("Provided signature does not match the calculated signature for the request")]
    SignatureMismatch,

    /// An authentication header was supplied more than once.
    #[error("Header {name} was provided more than once")]
    DuplicateHeader {
        /// Lower-cased header name.
        name: String,
    },
}

/// Reasons a request body is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The body is not valid JSON.
    #[error("{message}")]
    Syntax {
        /// Parser message.
        message: String,
    },

    /// The top-level JSON value is not an object.
    #[error("Data is not an object")]
    NotAnObject,

    /// `module` is missing or not a string.
    #[error("No module provided")]
    MissingModule,

    /// `handler` is missing or not a string.
    #[error("No handler provided")]
    MissingHandler,

    /// `context` is missing or not an object.
    #[error("No context provided")]
    MissingContext,

    /// The `payload` key is absent.
    #[error("No payload provided")]
    MissingPayload,
}

/// Failures while obtaining an invocable handler from a module.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// No file matched the module path.
    #[error("handler module not found: {}", .path.display())]
    NotFound {
        /// Requested module path.
        path: PathBuf,
    },

    /// The module file could not be read.
    #[error("failed to read handler module {}: {source}", .path.display())]
    Read {
        /// Resolved module file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The module source failed to compile.
    #[error("{message}")]
    Compile {
        /// Compiler message, prefixed with the chunk location.
        message: String,
    },

    /// Evaluating the module body raised an error.
    #[error("{message}")]
    Evaluate {
        /// Error raised while evaluating.
        message: String,
    },

    /// The export, after unwrapping `default`, is not a function.
    #[error("Expected a function to be exported, got {type_name}")]
    NotInvocable {
        /// Lua type name of the unwrapped export.
        type_name: &'static str,
    },

    /// A worker process reported that loading failed.
    #[error("{message}")]
    Reported {
        /// Message produced by the worker.
        message: String,
    },
}

/// A failure raised or returned by the handler itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error carrying the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the handler-provided message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Breakdown of the isolated execution mechanism.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker process could not be spawned.
    #[error("worker '{}' failed to start: {source}", .program.display())]
    Spawn {
        /// Worker executable.
        program: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A standard stream of the worker was not captured.
    #[error("failed to capture worker {stream}")]
    MissingPipe {
        /// Stream name.
        stream: &'static str,
    },

    /// Communicating with the worker failed.
    #[error("I/O error communicating with worker: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The worker request could not be serialised.
    #[error("failed to serialise worker request: {0}")]
    SerializeRequest(#[source] serde_json::Error),

    /// The worker exited without writing a response.
    #[error("worker exited without a response ({status})")]
    NoResponse {
        /// Exit status description.
        status: String,
    },

    /// The worker wrote something other than a protocol message.
    #[error("worker wrote an invalid response: {message}")]
    InvalidResponse {
        /// Description of the protocol violation.
        message: String,
        /// Optional underlying JSON error.
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Outcome of a failed handler invocation, as reported by a loader.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The handler could not be obtained.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The handler ran and failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The isolation mechanism broke down.
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Request failures reported through the response envelope.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// Authentication failed.
    #[error("Authorization failed: {0}")]
    Authorization(#[from] AuthError),

    /// The body is malformed.
    #[error("Invalid request body: {0}")]
    InvalidRequest(#[from] RequestError),

    /// The requested module id has no registration.
    #[error("Module \"{module}\" is not registered in runtime")]
    ModuleNotRegistered {
        /// Requested module id.
        module: String,
    },

    /// The handler could not be loaded.
    #[error("Error loading handler \"{handler}\": {source}")]
    Load {
        /// Handler reference from the request.
        handler: String,
        /// Underlying load failure.
        #[source]
        source: LoadError,
    },

    /// The handler itself failed.
    #[error("{0}")]
    Handler(#[from] HandlerError),
}
