//! IPC protocol types for caller-worker communication.
//!
//! The protocol is a single-line JSONL exchange over stdio. The caller
//! writes one [`WorkerRequest`] line to the worker's stdin and closes it.
//! The worker writes one [`WorkerResponse`] line to stdout and exits. Worker
//! stderr carries logs and is not part of the protocol.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HandlerError, InvokeError, LoadError};

/// Request sent to a worker on stdin.
///
/// # Example
///
/// ```
/// use std::path::Path;
///
/// use serde_json::json;
/// use slicknode_runtime::protocol::WorkerRequest;
///
/// let request = WorkerRequest::new(Path::new("/srv/m/h"), json!({"n": 1}), json!({}));
/// assert_eq!(
///     serde_json::to_value(&request).expect("serialise"),
///     json!({"modulePath": "/srv/m/h", "args": [{"n": 1}, {}]}),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    module_path: PathBuf,
    args: (Value, Value),
}

impl WorkerRequest {
    /// Creates a request to invoke the handler at `module_path`.
    #[must_use]
    pub fn new(module_path: &Path, payload: Value, context: Value) -> Self {
        Self {
            module_path: module_path.to_path_buf(),
            args: (payload, context),
        }
    }

    /// Returns the module path of the handler.
    #[must_use]
    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    /// Returns the payload argument.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.args.0
    }

    /// Returns the context argument.
    #[must_use]
    pub const fn context(&self) -> &Value {
        &self.args.1
    }
}

/// Response written by a worker on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerResponse {
    /// The handler completed with this result.
    Data(Value),
    /// Loading or running the handler failed.
    Error(WorkerFailure),
}

/// Failure details reported by a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFailure {
    kind: FailureKind,
    message: String,
}

/// Stage at which a worker invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The handler could not be obtained.
    Load,
    /// The handler ran and failed.
    Handler,
}

impl WorkerFailure {
    /// Returns the failure stage.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the failure message.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl WorkerResponse {
    /// Builds a response reporting a load failure.
    #[must_use]
    pub fn load_failure(error: &LoadError) -> Self {
        Self::Error(WorkerFailure {
            kind: FailureKind::Load,
            message: error.to_string(),
        })
    }

    /// Builds a response reporting a handler failure.
    #[must_use]
    pub fn handler_failure(error: &HandlerError) -> Self {
        Self::Error(WorkerFailure {
            kind: FailureKind::Handler,
            message: error.message().to_owned(),
        })
    }

    /// Converts the response into the invocation outcome.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Load`] or [`InvokeError::Handler`] according to
    /// the reported failure stage.
    pub fn into_result(self) -> Result<Value, InvokeError> {
        match self {
            Self::Data(data) => Ok(data),
            Self::Error(WorkerFailure {
                kind: FailureKind::Load,
                message,
            }) => Err(LoadError::Reported { message }.into()),
            Self::Error(WorkerFailure {
                kind: FailureKind::Handler,
                message,
            }) => Err(HandlerError::new(message).into()),
        }
    }
}
