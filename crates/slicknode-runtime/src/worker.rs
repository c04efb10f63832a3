//! Worker side of isolated execution.
//!
//! The `slicknode-worker` binary reads one [`WorkerRequest`] line from
//! stdin, loads the handler in a fresh Lua VM, invokes it, and writes one
//! [`WorkerResponse`] line to stdout.

use std::io::{self, BufRead, Write};

use mlua::Lua;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::handler;
use crate::protocol::{WorkerRequest, WorkerResponse};

/// Tracing target for worker operations.
const WORKER_TARGET: &str = "slicknode_runtime::worker";

/// Failures that prevent the worker from answering a request.
#[derive(Debug, Error)]
pub enum WorkerDispatchError {
    /// Reading the request or writing the response failed.
    #[error("worker I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Stdin closed before a request arrived.
    #[error("no request received on stdin")]
    NoRequest,

    /// The request line is not a protocol message.
    #[error("invalid worker request: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    /// The response could not be serialised.
    #[error("failed to serialise worker response: {0}")]
    SerializeResponse(#[source] serde_json::Error),
}

/// Reads one request, executes it, and writes the response.
///
/// # Errors
///
/// Returns a [`WorkerDispatchError`] when no valid request can be read or
/// the response cannot be written. Handler and load failures are reported
/// in the response instead.
pub fn run(reader: &mut impl BufRead, writer: &mut impl Write) -> Result<(), WorkerDispatchError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(WorkerDispatchError::NoRequest);
    }
    let request: WorkerRequest =
        serde_json::from_str(line.trim()).map_err(WorkerDispatchError::InvalidRequest)?;

    let response = execute(&request);
    let mut encoded =
        serde_json::to_vec(&response).map_err(WorkerDispatchError::SerializeResponse)?;
    encoded.push(b'\n');
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

/// Loads and invokes the requested handler in a fresh Lua VM.
///
/// Handler output from `print` and `io.write` goes to stderr.
#[must_use]
pub fn execute(request: &WorkerRequest) -> WorkerResponse {
    let lua = Lua::new();
    debug!(
        target: WORKER_TARGET,
        module_path = %request.module_path().display(),
        "executing handler"
    );

    if let Err(err) = handler::route_output_to_stderr(&lua) {
        let failure = LoadError::Evaluate {
            message: handler::describe(&err),
        };
        warn!(target: WORKER_TARGET, error = %failure, "failed to redirect handler output");
        return WorkerResponse::load_failure(&failure);
    }

    let function = match handler::load_export(&lua, request.module_path())
        .and_then(handler::unwrap_invocable)
    {
        Ok(function) => function,
        Err(err) => {
            warn!(target: WORKER_TARGET, error = %err, "handler failed to load");
            return WorkerResponse::load_failure(&err);
        }
    };

    match handler::invoke(&lua, &function, request.payload(), request.context()) {
        Ok(data) => WorkerResponse::Data(data),
        Err(err) => {
            debug!(target: WORKER_TARGET, error = %err, "handler failed");
            WorkerResponse::handler_failure(&err)
        }
    }
}
