//! Process-isolated handler execution.
//!
//! [`IsolatedLoader`] spawns the `slicknode-worker` executable for every
//! invocation, writes the [`WorkerRequest`] to its stdin as a single JSONL
//! line, closes stdin, reads one JSONL [`WorkerResponse`] line from stdout
//! and reaps the process. Worker stderr is forwarded to debug logs. The
//! worker has its own Lua VM and no module cache, so every call observes the
//! current contents of the handler file.

use std::env;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use slicknode_config::WORKER_BINARY_NAME;
use tracing::{debug, warn};

use super::{HandlerLoader, LOADER_TARGET};
use crate::error::{InvokeError, WorkerError};
use crate::protocol::{WorkerRequest, WorkerResponse};

/// Runs each handler invocation in a disposable worker process.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
///
/// use serde_json::json;
/// use slicknode_runtime::loader::{HandlerLoader, IsolatedLoader};
///
/// let loader = IsolatedLoader::new("/usr/local/bin/slicknode-worker");
/// let result = loader.invoke(Path::new("/srv/modules/a/handler"), &json!({}), &json!({}));
/// ```
#[derive(Debug, Clone)]
pub struct IsolatedLoader {
    program: PathBuf,
}

impl IsolatedLoader {
    /// Creates a loader that spawns the given worker executable.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Returns the worker executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for IsolatedLoader {
    fn default() -> Self {
        Self::new(default_worker_program())
    }
}

impl HandlerLoader for IsolatedLoader {
    fn invoke(
        &self,
        module_path: &Path,
        payload: &serde_json::Value,
        context: &serde_json::Value,
    ) -> Result<serde_json::Value, InvokeError> {
        let request = WorkerRequest::new(module_path, payload.clone(), context.clone());
        run_worker(&self.program, &request)?.into_result()
    }
}

/// Returns the worker executable installed next to the current executable,
/// falling back to resolving `slicknode-worker` through `PATH`.
#[must_use]
pub fn default_worker_program() -> PathBuf {
    let file_name = format!("{WORKER_BINARY_NAME}{}", env::consts::EXE_SUFFIX);
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// Spawns the worker, exchanges one request and response, and reaps it.
fn run_worker(program: &Path, request: &WorkerRequest) -> Result<WorkerResponse, WorkerError> {
    debug!(
        target: LOADER_TARGET,
        program = %program.display(),
        module_path = %request.module_path().display(),
        "spawning handler worker"
    );

    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| WorkerError::Spawn {
            program: program.to_path_buf(),
            source: Arc::new(err),
        })?;

    let stderr_drain = child.stderr.take().map(spawn_stderr_drain);
    let outcome = exchange(&mut child, request);
    if outcome.is_err() {
        drop(child.kill());
    }
    let exit = child.wait();
    if let Some(handle) = stderr_drain {
        drop(handle.join());
    }

    let response_line = outcome?;
    let status = exit.map_err(|err| WorkerError::Io {
        source: Arc::new(err),
    })?;
    debug!(target: LOADER_TARGET, ?status, "handler worker exited");

    let Some(line) = response_line else {
        return Err(WorkerError::NoResponse {
            status: status.to_string(),
        });
    };
    parse_response(&line)
}

/// Writes the request and reads the single response line, if any.
fn exchange(child: &mut Child, request: &WorkerRequest) -> Result<Option<String>, WorkerError> {
    let stdin = child
        .stdin
        .take()
        .ok_or(WorkerError::MissingPipe { stream: "stdin" })?;
    let stdout = child
        .stdout
        .take()
        .ok_or(WorkerError::MissingPipe { stream: "stdout" })?;
    write_request(stdin, request)?;
    read_response(stdout)
}

/// Writes the serialised request to the worker's stdin and closes it.
fn write_request(mut stdin: impl Write, request: &WorkerRequest) -> Result<(), WorkerError> {
    let mut json = serde_json::to_vec(request).map_err(WorkerError::SerializeRequest)?;
    json.push(b'\n');
    debug!(
        target: LOADER_TARGET,
        request_bytes = json.len(),
        "writing request to worker stdin"
    );
    stdin
        .write_all(&json)
        .and_then(|()| stdin.flush())
        .map_err(|err| WorkerError::Io {
            source: Arc::new(err),
        })
}

/// Reads one JSONL line from the worker's stdout.
fn read_response(stdout: impl Read) -> Result<Option<String>, WorkerError> {
    let mut line = String::new();
    let bytes_read = BufReader::new(stdout)
        .read_line(&mut line)
        .map_err(|err| WorkerError::Io {
            source: Arc::new(err),
        })?;
    Ok((bytes_read > 0).then_some(line))
}

/// Forwards worker stderr to debug logs without blocking the exchange.
fn spawn_stderr_drain(stderr: ChildStderr) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(stderr).lines() {
            match line {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(target: LOADER_TARGET, stderr = %text.trim(), "worker stderr output");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(target: LOADER_TARGET, error = %err, "failed to read worker stderr");
                    break;
                }
            }
        }
    })
}

/// Parses a JSONL response line into a [`WorkerResponse`].
fn parse_response(line: &str) -> Result<WorkerResponse, WorkerError> {
    serde_json::from_str(line.trim()).map_err(|err| WorkerError::InvalidResponse {
        message: format!("worker produced invalid JSON: {err}"),
        source: Some(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_response() {
        let response = parse_response("{\"data\":{\"data\":\"Hello\"}}\n").expect("valid");
        assert_eq!(response, WorkerResponse::Data(serde_json::json!({"data": "Hello"})));
    }

    #[test]
    fn rejects_non_protocol_line() {
        let err = parse_response("hello from lua").expect_err("invalid");
        assert!(
            matches!(err, WorkerError::InvalidResponse { source: Some(_), .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn empty_stdout_has_no_response() {
        assert_eq!(read_response(std::io::empty()).expect("read"), None);
    }

    #[test]
    fn request_is_one_terminated_line() {
        let mut buffer = Vec::new();
        let request = WorkerRequest::new(
            Path::new("/srv/modules/a/h"),
            serde_json::json!({"n": 1}),
            serde_json::json!({}),
        );
        write_request(&mut buffer, &request).expect("write");
        assert_eq!(buffer.iter().filter(|byte| **byte == b'\n').count(), 1);
        assert_eq!(buffer.last(), Some(&b'\n'));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let loader = IsolatedLoader::new("/nonexistent/slicknode-worker");
        let err = loader
            .invoke(
                Path::new("/srv/modules/a/h"),
                &serde_json::Value::Null,
                &serde_json::json!({}),
            )
            .expect_err("spawn failure");
        assert!(
            matches!(err, InvokeError::Worker(WorkerError::Spawn { .. })),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn default_program_is_named_after_worker() {
        let program = default_worker_program();
        let name = program
            .file_name()
            .and_then(|name| name.to_str())
            .expect("file name");
        assert!(name.starts_with(WORKER_BINARY_NAME), "unexpected program: {name}");
    }
}
