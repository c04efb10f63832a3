//! In-process handler loading with an export cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use mlua::{Lua, RegistryKey, Value};
use tracing::debug;

use super::{HandlerLoader, LOADER_TARGET};
use crate::error::{InvokeError, LoadError};
use crate::handler;

/// Runs handlers in a shared Lua VM.
///
/// The first call for a module file evaluates it and caches its export
/// under the resolved file path; later calls reuse the cached export even if
/// the file changed on disk. Failed loads are not cached.
pub struct DirectLoader {
    lua: Lua,
    exports: Mutex<HashMap<PathBuf, RegistryKey>>,
}

impl DirectLoader {
    /// Creates a loader with a fresh Lua VM and an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lua: Lua::new(),
            exports: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of cached module exports.
    #[must_use]
    pub fn cached_modules(&self) -> usize {
        self.exports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn export(&self, module_path: &Path) -> Result<Value, LoadError> {
        let file = handler::resolve_module_path(module_path)?;
        let mut exports = self
            .exports
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(key) = exports.get(&file) {
            return self
                .lua
                .registry_value::<Value>(key)
                .map_err(|err| LoadError::Evaluate {
                    message: handler::describe(&err),
                });
        }

        debug!(
            target: LOADER_TARGET,
            module_path = %module_path.display(),
            file = %file.display(),
            "loading handler module"
        );
        let export = handler::load_file(&self.lua, &file)?;
        let key = self
            .lua
            .create_registry_value(export.clone())
            .map_err(|err| LoadError::Evaluate {
                message: handler::describe(&err),
            })?;
        exports.insert(file, key);
        Ok(export)
    }
}

impl Default for DirectLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DirectLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectLoader")
            .field("cached_modules", &self.cached_modules())
            .finish_non_exhaustive()
    }
}

impl HandlerLoader for DirectLoader {
    fn invoke(
        &self,
        module_path: &Path,
        payload: &serde_json::Value,
        context: &serde_json::Value,
    ) -> Result<serde_json::Value, InvokeError> {
        let function = handler::unwrap_invocable(self.export(module_path)?)?;
        Ok(handler::invoke(&self.lua, &function, payload, context)?)
    }
}
