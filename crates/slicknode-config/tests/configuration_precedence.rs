//! Layering tests for the runtime configuration.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use slicknode_config::{Config, DEFAULT_MAX_CLOCK_DRIFT};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let previous = std::env::var_os(key);
        // Environment mutation is unsafe in edition 2024; the override is
        // restored in `Drop` while the mutex is still held.
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

fn args(extra: &[&str]) -> Vec<OsString> {
    std::iter::once("slicknode-worker")
        .chain(extra.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn defaults_apply_without_overrides() {
    let _guard = ENV_MUTEX.lock().expect("env mutex poisoned");
    let config = Config::load_from_iter(args(&[])).expect("load defaults");
    assert_eq!(config.max_clock_drift(), DEFAULT_MAX_CLOCK_DRIFT);
    assert!(!config.isolated());
}

#[test]
fn environment_overrides_clock_drift() {
    let _env = EnvOverride::set_var("SLICKNODE_MAX_CLOCK_DRIFT", OsStr::new("200"));
    let config = Config::load_from_iter(args(&[])).expect("load with env");
    assert_eq!(config.max_clock_drift(), 200);
}

#[test]
fn cli_flag_wins_over_environment() {
    let _env = EnvOverride::set_var("SLICKNODE_MAX_CLOCK_DRIFT", OsStr::new("200"));
    let config = Config::load_from_iter(args(&["--max-clock-drift", "30"]))
        .expect("load with cli flag");
    assert_eq!(config.max_clock_drift(), 30);
}

#[test]
fn environment_supplies_secret() {
    let _env = EnvOverride::set_var("SLICKNODE_SECRET", OsStr::new("from-env"));
    let config = Config::load_from_iter(args(&[])).expect("load with secret");
    assert_eq!(config.secret(), Some("from-env"));
}
