//! Request execution pipeline.
//!
//! The [`Executor`] is the entry point for callers. Each request passes
//! through authentication, body parsing, module resolution, and handler
//! loading and invocation, in that order. Every outcome, including every
//! failure and any panic raised along the way, becomes a
//! [`RuntimeResponse`]. Only a breakdown of the isolated worker mechanism is
//! returned as an error.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::{Authenticator, Clock};
use crate::error::{InvokeError, RuntimeError, WorkerError};
use crate::headers::Headers;
use crate::loader::{DirectLoader, HandlerLoader, IsolatedLoader};
use crate::options::RuntimeOptions;
use crate::registry::ModuleRegistry;
use crate::request::parse_request;
use crate::response::RuntimeResponse;

/// Tracing target for request execution.
const EXECUTOR_TARGET: &str = "slicknode_runtime::executor";

/// Failure of a single dispatch, before it is folded into a response.
#[derive(Debug)]
enum DispatchError {
    Runtime(RuntimeError),
    Worker(WorkerError),
}

impl From<RuntimeError> for DispatchError {
    fn from(err: RuntimeError) -> Self {
        Self::Runtime(err)
    }
}

/// Authenticates, parses and dispatches handler requests.
///
/// # Example
///
/// ```
/// use slicknode_runtime::{Executor, Headers, ModuleRegistry, RuntimeOptions};
///
/// let mut registry = ModuleRegistry::new();
/// registry.register("test-module", "/srv/modules/test");
/// let options = RuntimeOptions::new().with_secret("somesecret");
/// let executor = Executor::new(&options, registry);
///
/// let response = executor.execute(b"{}", &Headers::new()).expect("no worker involved");
/// assert_eq!(
///     response.error_message(),
///     Some("Authorization failed: No authorization header found"),
/// );
/// ```
pub struct Executor {
    registry: ModuleRegistry,
    authenticator: Authenticator,
    loader: Box<dyn HandlerLoader>,
}

impl Executor {
    /// Creates an executor, choosing the loading strategy from the options.
    #[must_use]
    pub fn new(options: &RuntimeOptions, registry: ModuleRegistry) -> Self {
        let loader: Box<dyn HandlerLoader> = if options.isolated() {
            Box::new(
                options
                    .worker_program()
                    .map_or_else(IsolatedLoader::default, IsolatedLoader::new),
            )
        } else {
            Box::new(DirectLoader::new())
        };
        Self::with_loader(options, registry, loader)
    }

    /// Creates an executor with an explicit loader.
    #[must_use]
    pub fn with_loader(
        options: &RuntimeOptions,
        registry: ModuleRegistry,
        loader: Box<dyn HandlerLoader>,
    ) -> Self {
        Self {
            registry,
            authenticator: Authenticator::from_options(options),
            loader,
        }
    }

    /// Replaces the clock used for timestamp checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.authenticator = self.authenticator.with_clock(clock);
        self
    }

    /// Registers the base path of a module.
    pub fn register(&mut self, module_id: impl Into<String>, base_path: impl Into<String>) {
        self.registry.register(module_id, base_path);
    }

    /// Returns the module registry.
    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Executes a raw request.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkerError`] only when an isolated worker could not be
    /// spawned, or exited without a valid response. All other failures are
    /// reported in the returned [`RuntimeResponse`].
    pub fn execute(&self, body: &[u8], headers: &Headers) -> Result<RuntimeResponse, WorkerError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(body, headers)));
        match outcome {
            Ok(Ok(data)) => Ok(RuntimeResponse::success(data)),
            Ok(Err(DispatchError::Runtime(err))) => {
                log_failure(&err);
                Ok(RuntimeResponse::failure(err.to_string()))
            }
            Ok(Err(DispatchError::Worker(err))) => {
                error!(target: EXECUTOR_TARGET, error = %err, "handler worker failed");
                Err(err)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(target: EXECUTOR_TARGET, %message, "request execution panicked");
                Ok(RuntimeResponse::failure(format!(
                    "Unexpected error executing request: {message}"
                )))
            }
        }
    }

    fn dispatch(&self, body: &[u8], headers: &Headers) -> Result<Value, DispatchError> {
        self.authenticator
            .authenticate(body, headers)
            .map_err(RuntimeError::from)?;
        let request = parse_request(body).map_err(RuntimeError::from)?;
        let module_path = self
            .registry
            .module_path(request.module(), request.handler())?;

        debug!(
            target: EXECUTOR_TARGET,
            module = request.module(),
            handler = request.handler(),
            request_id = request.request_id(),
            "invoking handler"
        );

        self.loader
            .invoke(&module_path, request.payload(), request.context())
            .map_err(|err| match err {
                InvokeError::Load(source) => DispatchError::Runtime(RuntimeError::Load {
                    handler: request.handler().to_owned(),
                    source,
                }),
                InvokeError::Handler(failure) => {
                    DispatchError::Runtime(RuntimeError::Handler(failure))
                }
                InvokeError::Worker(failure) => DispatchError::Worker(failure),
            })
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

fn log_failure(err: &RuntimeError) {
    match err {
        RuntimeError::Authorization(_)
        | RuntimeError::InvalidRequest(_)
        | RuntimeError::ModuleNotRegistered { .. } => {
            warn!(target: EXECUTOR_TARGET, error = %err, "request rejected");
        }
        RuntimeError::Load { .. } => {
            error!(target: EXECUTOR_TARGET, error = %err, "handler failed to load");
        }
        RuntimeError::Handler(_) => {
            error!(target: EXECUTOR_TARGET, error = %err, "handler execution failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("unknown panic"))
}
