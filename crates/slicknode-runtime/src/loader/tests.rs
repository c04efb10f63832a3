//! Unit tests for the in-process loader.

use std::fs;
use std::path::{Path, PathBuf};

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tempfile::TempDir;

use super::*;
use crate::error::LoadError;

#[fixture]
fn module_dir() -> TempDir {
    TempDir::new().expect("tempdir")
}

fn write_module(dir: &Path, name: &str, source: &str) -> PathBuf {
    fs::write(dir.join(format!("{name}.lua")), source).expect("write module");
    dir.join(name)
}

fn versioned(version: &str) -> String {
    format!("return function() return {{ version = '{version}' }} end\n")
}

#[rstest]
fn invokes_handler_with_arguments(module_dir: TempDir) {
    let path = write_module(
        module_dir.path(),
        "echo",
        "return function(payload, context) return { name = payload.name, id = context.id } end",
    );
    let loader = DirectLoader::new();
    let result = loader
        .invoke(&path, &json!({"name": "myname"}), &json!({"id": "1234xyz"}))
        .expect("invoke");
    assert_eq!(result, json!({"name": "myname", "id": "1234xyz"}));
}

#[rstest]
fn keeps_first_export_after_file_changes(module_dir: TempDir) {
    let path = write_module(module_dir.path(), "cached", &versioned("v1"));
    let loader = DirectLoader::new();
    let first = loader.invoke(&path, &Value::Null, &json!({})).expect("v1");

    write_module(module_dir.path(), "cached", &versioned("v2"));
    let second = loader.invoke(&path, &Value::Null, &json!({})).expect("cached");

    assert_eq!(first, json!({"version": "v1"}));
    assert_eq!(second, json!({"version": "v1"}));
    assert_eq!(loader.cached_modules(), 1);
}

#[rstest]
fn aliases_of_one_file_share_a_cache_entry(module_dir: TempDir) {
    let path = write_module(module_dir.path(), "aliased", &versioned("v1"));
    let with_extension = module_dir.path().join("aliased.lua");
    let loader = DirectLoader::new();
    let first = loader.invoke(&path, &Value::Null, &json!({})).expect("v1");

    write_module(module_dir.path(), "aliased", &versioned("v2"));
    let second = loader
        .invoke(&with_extension, &Value::Null, &json!({}))
        .expect("cached");

    assert_eq!(first, json!({"version": "v1"}));
    assert_eq!(second, json!({"version": "v1"}));
    assert_eq!(loader.cached_modules(), 1);
}

#[rstest]
fn separate_loaders_do_not_share_exports(module_dir: TempDir) {
    let path = write_module(module_dir.path(), "fresh", &versioned("v1"));
    let first = DirectLoader::new()
        .invoke(&path, &Value::Null, &json!({}))
        .expect("v1");

    write_module(module_dir.path(), "fresh", &versioned("v2"));
    let second = DirectLoader::new()
        .invoke(&path, &Value::Null, &json!({}))
        .expect("v2");

    assert_eq!(first, json!({"version": "v1"}));
    assert_eq!(second, json!({"version": "v2"}));
}

#[rstest]
fn failed_loads_are_not_cached(module_dir: TempDir) {
    let path = module_dir.path().join("late");
    let loader = DirectLoader::new();

    let missing = loader.invoke(&path, &Value::Null, &json!({}));
    assert!(
        matches!(missing, Err(InvokeError::Load(LoadError::NotFound { .. }))),
        "unexpected result: {missing:?}"
    );
    assert_eq!(loader.cached_modules(), 0);

    write_module(module_dir.path(), "late", &versioned("v1"));
    let loaded = loader.invoke(&path, &Value::Null, &json!({})).expect("loaded");
    assert_eq!(loaded, json!({"version": "v1"}));
    assert_eq!(loader.cached_modules(), 1);
}

#[rstest]
fn non_invocable_exports_are_load_errors(module_dir: TempDir) {
    let path = write_module(module_dir.path(), "table", "return { value = 1 }");
    let result = DirectLoader::new().invoke(&path, &Value::Null, &json!({}));
    match result {
        Err(InvokeError::Load(err)) => assert_eq!(
            err.to_string(),
            "Expected a function to be exported, got nil"
        ),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[rstest]
fn raised_errors_are_handler_errors(module_dir: TempDir) {
    let path = write_module(
        module_dir.path(),
        "raises",
        "return function() error('Handler failed', 0) end",
    );
    let loader = DirectLoader::new();
    let result = loader.invoke(&path, &Value::Null, &json!({}));
    match result {
        Err(InvokeError::Handler(err)) => assert_eq!(err.message(), "Handler failed"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(loader.cached_modules(), 1);
}

#[test]
fn debug_output_reports_cache_size() {
    let rendered = format!("{:?}", DirectLoader::default());
    assert!(rendered.contains("cached_modules: 0"), "{rendered}");
}
