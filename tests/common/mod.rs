//! Shared helpers for integration tests.

use std::path::Path;
use std::sync::Once;

/// Installs a `tracing` subscriber once per test binary.
///
/// Controlled by `RUST_LOG`; output goes through the test writer so it is
/// captured per test.
#[allow(dead_code)]
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Reads a finished trace file and returns its raw text and the parsed
/// `traceEvents` array.
#[allow(dead_code)]
pub fn read_trace(path: &Path) -> (String, Vec<serde_json::Value>) {
    let raw = std::fs::read_to_string(path).expect("trace file readable");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("trace file is valid JSON");
    let events = parsed["traceEvents"]
        .as_array()
        .expect("traceEvents is an array")
        .clone();
    (raw, events)
}
