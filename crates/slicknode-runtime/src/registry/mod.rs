//! Module registry mapping module ids to base paths.
//!
//! The [`ModuleRegistry`] stores the base directory of every registered
//! module. Base paths are normalised to end with a path separator so that a
//! handler reference can be appended directly. Registering an id again
//! replaces its base path.

use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR, PathBuf, is_separator};

use tracing::debug;

use crate::error::RuntimeError;

/// Tracing target for registry operations.
const REGISTRY_TARGET: &str = "slicknode_runtime::registry";

/// Registry of module base paths.
///
/// # Example
///
/// ```
/// use slicknode_runtime::ModuleRegistry;
///
/// let mut registry = ModuleRegistry::new();
/// registry.register("test-module", "/srv/modules/test");
/// assert_eq!(registry.get("test-module"), Some("/srv/modules/test/"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, String>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the base path of a module.
    pub fn register(&mut self, module_id: impl Into<String>, base_path: impl Into<String>) {
        let id: String = module_id.into();
        let mut path: String = base_path.into();
        if !path.chars().next_back().is_some_and(is_separator) {
            path.push(MAIN_SEPARATOR);
        }
        debug!(
            target: REGISTRY_TARGET,
            module = %id,
            base_path = %path,
            "registering module"
        );
        if let Some(previous) = self.modules.insert(id.clone(), path) {
            debug!(
                target: REGISTRY_TARGET,
                module = %id,
                previous = %previous,
                "replaced existing module registration"
            );
        }
    }

    /// Looks up the base path of a module.
    #[must_use]
    pub fn get(&self, module_id: &str) -> Option<&str> {
        self.modules.get(module_id).map(String::as_str)
    }

    /// Resolves the base path of a module.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ModuleNotRegistered`] for an unknown id.
    pub fn resolve(&self, module_id: &str) -> Result<&str, RuntimeError> {
        self.get(module_id)
            .ok_or_else(|| RuntimeError::ModuleNotRegistered {
                module: module_id.to_owned(),
            })
    }

    /// Builds the module path of a handler by appending the handler
    /// reference to the module's base path.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::ModuleNotRegistered`] for an unknown id.
    pub fn module_path(&self, module_id: &str, handler: &str) -> Result<PathBuf, RuntimeError> {
        let base_path = self.resolve(module_id)?;
        Ok(PathBuf::from(format!("{base_path}{handler}")))
    }

    /// Returns `true` when the module id is registered.
    #[must_use]
    pub fn contains(&self, module_id: &str) -> bool {
        self.modules.contains_key(module_id)
    }

    /// Returns the number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` when no modules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests;
