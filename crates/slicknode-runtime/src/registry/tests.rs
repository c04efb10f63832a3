//! Unit tests for the module registry.

use std::path::Path;

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register("test-module", "/srv/modules/a");
    registry
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn new_registry_is_empty() {
    let registry = ModuleRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[rstest]
#[case::without_separator("/srv/modules/a", "/srv/modules/a/")]
#[case::with_separator("/srv/modules/a/", "/srv/modules/a/")]
#[case::relative("modules", "modules/")]
fn base_path_always_ends_with_separator(#[case] base_path: &str, #[case] expected: &str) {
    let mut registry = ModuleRegistry::new();
    registry.register("m", base_path);
    assert_eq!(registry.get("m"), Some(expected));
}

#[rstest]
fn registering_again_replaces_base_path(mut registry: ModuleRegistry) {
    registry.register("test-module", "/srv/modules/b");
    assert_eq!(registry.get("test-module"), Some("/srv/modules/b/"));
    assert_eq!(registry.len(), 1);
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[rstest]
fn resolves_registered_module(registry: ModuleRegistry) {
    assert!(registry.contains("test-module"));
    assert_eq!(registry.resolve("test-module").ok(), Some("/srv/modules/a/"));
}

#[rstest]
fn unknown_module_is_reported(registry: ModuleRegistry) {
    let err = registry.resolve("x").expect_err("unregistered");
    assert_eq!(err.to_string(), "Module \"x\" is not registered in runtime");
}

#[rstest]
fn module_path_appends_handler(registry: ModuleRegistry) {
    let path = registry
        .module_path("test-module", "handlers/sync-handler1")
        .expect("registered");
    assert_eq!(path, Path::new("/srv/modules/a/handlers/sync-handler1"));
}

#[rstest]
fn module_path_for_unknown_module_fails(registry: ModuleRegistry) {
    assert!(matches!(
        registry.module_path("other", "h"),
        Err(RuntimeError::ModuleNotRegistered { ref module }) if module == "other"
    ));
}
