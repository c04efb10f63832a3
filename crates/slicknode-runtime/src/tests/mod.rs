//! Crate-level integration and BDD tests.

use std::sync::Arc;

use serde_json::json;

use crate::auth::Clock;
use crate::executor::Executor;
use crate::options::RuntimeOptions;
use crate::registry::ModuleRegistry;
use crate::response::RuntimeResponse;
use crate::signature::auth_headers;


/// Directory holding the Lua handler fixtures.
const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/module-a");

/// Unix time the test clock reports.
const NOW: i64 = 1_700_000_000;

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(NOW))
}

#[test]
fn end_to_end_direct_execution() {
    let mut registry = ModuleRegistry::new();
    registry.register("test-module", FIXTURES);
    let options = RuntimeOptions::new().with_secret("somesecret");
    let executor = Executor::new(&options, registry).with_clock(fixed_clock());

    let body = json!({
        "module": "test-module",
        "handler": "sync-handler1",
        "payload": {"args": {"name": "myname"}},
        "context": {},
    })
    .to_string();
    let headers = auth_headers("somesecret", NOW, body.as_bytes()).expect("sign");
    let response = executor
        .execute(body.as_bytes(), &headers)
        .expect("no worker failure");
    assert_eq!(
        response,
        RuntimeResponse::success(json!({"data": "Hello myname"}))
    );
}
