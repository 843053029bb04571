//! Begin/end pairing guarantees of `ScopedSpan`.

mod common;

use common::*;
use tracekit::{Arg, ScopedSpan, TraceRecorder};

fn early_return_path(recorder: &TraceRecorder, bail: bool) -> u32 {
    let _span = ScopedSpan::new(recorder, "logic", "compute");
    if bail {
        return 0;
    }
    1
}

#[test]
fn one_end_per_begin_on_normal_and_early_return() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");

    let recorder = TraceRecorder::new();
    recorder.init(&path).unwrap();
    early_return_path(&recorder, false);
    early_return_path(&recorder, true);
    recorder.shutdown().unwrap();

    let (_, events) = read_trace(&path);
    let phases: Vec<_> = events
        .iter()
        .map(|e| e["ph"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(phases, vec!["B", "E", "B", "E"]);
    assert!(events.iter().all(|e| e["name"] == "compute"));
}

#[test]
fn end_is_recorded_on_panic_unwind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");

    let recorder = TraceRecorder::new();
    recorder.init(&path).unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _span = ScopedSpan::new(&recorder, "logic", "doomed");
        panic!("boom");
    }));
    assert!(result.is_err());

    recorder.shutdown().unwrap();

    let (_, events) = read_trace(&path);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["ph"], "B");
    assert_eq!(events[1]["ph"], "E");
    assert_eq!(events[1]["name"], "doomed");
}

#[test]
fn argument_is_carried_on_both_begin_and_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");

    let recorder = TraceRecorder::new();
    recorder.init(&path).unwrap();
    {
        let _span = ScopedSpan::with_arg(&recorder, "io", "read", Arg::int("fd", 3));
    }
    recorder.shutdown().unwrap();

    let (_, events) = read_trace(&path);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["ph"], "B");
    assert_eq!(events[0]["args"]["fd"], 3);
    assert_eq!(events[1]["ph"], "E");
    assert_eq!(events[1]["args"]["fd"], 3);
}

#[test]
fn nested_spans_pair_in_stack_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");

    let recorder = TraceRecorder::new();
    recorder.init(&path).unwrap();
    {
        let _outer = ScopedSpan::new(&recorder, "logic", "outer");
        {
            let _inner = ScopedSpan::new(&recorder, "logic", "inner");
        }
    }
    recorder.shutdown().unwrap();

    let (_, events) = read_trace(&path);
    let pairs: Vec<_> = events
        .iter()
        .map(|e| {
            (
                e["ph"].as_str().unwrap().to_owned(),
                e["name"].as_str().unwrap().to_owned(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("B".into(), "outer".into()),
            ("B".into(), "inner".into()),
            ("E".into(), "inner".into()),
            ("E".into(), "outer".into()),
        ]
    );
}

/// Spans taken before init or after shutdown are no-ops, not errors.
#[test]
fn spans_outside_tracing_window_are_noops() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");

    let recorder = TraceRecorder::new();
    {
        let _span = ScopedSpan::new(&recorder, "early", "ignored");
    }

    recorder.init(&path).unwrap();
    {
        let _span = ScopedSpan::new(&recorder, "live", "kept");
    }
    recorder.shutdown().unwrap();

    {
        let _span = ScopedSpan::new(&recorder, "late", "ignored");
    }

    let (_, events) = read_trace(&path);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e["cat"] == "live"));
}
