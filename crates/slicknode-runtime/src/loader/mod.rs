//! Handler loading strategies.
//!
//! A [`HandlerLoader`] turns a module path into a running handler: it
//! obtains the export, unwraps the invocable and calls it with the payload
//! and context. Two strategies exist:
//!
//! - [`DirectLoader`] keeps one Lua VM and caches every evaluated export for
//!   its lifetime.
//! - [`IsolatedLoader`] spawns a fresh `slicknode-worker` process for every
//!   call, so changes to handler files are picked up immediately.

mod direct;
mod isolated;

use std::path::Path;

use serde_json::Value;

use crate::error::InvokeError;

pub use direct::DirectLoader;
pub use isolated::{IsolatedLoader, default_worker_program};

/// Tracing target for loader operations.
pub(crate) const LOADER_TARGET: &str = "slicknode_runtime::loader";

/// Strategy for loading and invoking handlers.
///
/// The executor selects an implementation at construction time. Test code
/// can implement this trait to observe or script invocations without Lua.
pub trait HandlerLoader: Send + Sync {
    /// Loads the handler at `module_path` and invokes it with the payload
    /// and context.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::Load`] if the handler cannot be obtained,
    /// [`InvokeError::Handler`] if it ran and failed, and
    /// [`InvokeError::Worker`] if the isolation mechanism broke down.
    fn invoke(
        &self,
        module_path: &Path,
        payload: &Value,
        context: &Value,
    ) -> Result<Value, InvokeError>;
}

#[cfg(test)]
mod tests;
