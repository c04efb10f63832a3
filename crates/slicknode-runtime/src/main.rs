//! Worker process for isolated handler execution.
//!
//! Reads one request line from stdin, runs the handler in a fresh Lua VM,
//! and writes one response line to stdout. Logs go to stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use slicknode_config::Config;
use slicknode_runtime::{telemetry, worker};

fn main() -> ExitCode {
    let config = Config::load().unwrap_or_default();
    if let Err(err) = telemetry::initialise(&config) {
        report(&err);
    }

    let mut reader = io::stdin().lock();
    let mut writer = io::stdout().lock();
    match worker::run(&mut reader, &mut writer) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &dyn std::error::Error) {
    drop(writeln!(io::stderr().lock(), "slicknode-worker: {err}"));
}
