//! Authenticated invocation gateway for Slicknode function handlers.
//!
//! The `slicknode-runtime` crate receives a signed request envelope,
//! authenticates it, resolves the named handler inside a registered module,
//! runs it with the supplied payload and context, and returns a normalised
//! [`RuntimeResponse`]. Handler failures, load failures and malformed input
//! never escape as errors; they are encoded in the response.
//!
//! # Architecture
//!
//! Requests are signed with HMAC-SHA256 over `"<timestamp>\n<body>"` (see
//! [`signature`]). The [`Executor`] checks the signature and timestamp,
//! parses the body, looks up the module base path in the
//! [`ModuleRegistry`], and hands the module path to a
//! [`HandlerLoader`](loader::HandlerLoader). Handlers are Lua modules:
//!
//! - the direct strategy runs them in a shared Lua VM and caches their
//!   exports for the life of the executor;
//! - the isolated strategy runs every call in a fresh `slicknode-worker`
//!   process, so edits to handler files show up on the next call.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use slicknode_runtime::signature::{auth_headers, current_timestamp};
//! use slicknode_runtime::{Executor, ModuleRegistry, RuntimeOptions};
//!
//! let mut registry = ModuleRegistry::new();
//! registry.register("test-module", "/srv/modules/test-module");
//! let executor = Executor::new(&RuntimeOptions::new().with_secret("somesecret"), registry);
//!
//! let body = json!({
//!     "module": "test-module",
//!     "handler": "handlers/greet",
//!     "payload": {"args": {"name": "myname"}},
//!     "context": {},
//! })
//! .to_string();
//! let headers = auth_headers("somesecret", current_timestamp(), body.as_bytes())
//!     .expect("valid key");
//! let response = executor.execute(body.as_bytes(), &headers).expect("worker healthy");
//! println!("{}", serde_json::to_string(&response).expect("serialise"));
//! ```

pub mod auth;
pub mod error;
pub mod executor;
pub mod handler;
pub mod headers;
pub mod loader;
pub mod options;
pub mod protocol;
pub mod registry;
pub mod request;
pub mod response;
pub mod signature;
pub mod telemetry;
pub mod worker;

#[cfg(test)]
mod tests;

pub use self::auth::{Authenticator, Clock, SystemClock};
pub use self::error::{
    AuthError, HandlerError, InvokeError, LoadError, RequestError, RuntimeError, WorkerError,
};
pub use self::executor::Executor;
pub use self::headers::Headers;
pub use self::options::RuntimeOptions;
pub use self::registry::ModuleRegistry;
pub use self::request::{RuntimeContext, RuntimeRequest};
pub use self::response::{ResponseError, RuntimeResponse};
