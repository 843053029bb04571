//! Scope-bound duration spans.
//!
//! [`ScopedSpan`] records a `DurationBegin` when constructed and the
//! matching `DurationEnd` when dropped, so every begin gets exactly one end
//! regardless of how control leaves the scope: normal return, early return,
//! `?`, or panic unwind.

use crate::event::Arg;
use crate::recorder::TraceRecorder;

/// RAII guard that traces the enclosing lexical scope as a duration span.
///
/// Not copyable or clonable: at most one end per begin.
///
/// ```ignore
/// let _span = ScopedSpan::new(tracekit::global(), "io", "read");
/// // ... traced work; the end event is recorded when `_span` drops ...
/// ```
#[must_use = "dropping a ScopedSpan immediately records a zero-length span"]
#[derive(Debug)]
pub struct ScopedSpan<'a> {
    recorder: &'a TraceRecorder,
    category: String,
    name: String,
    arg: Option<Arg>,
}

impl<'a> ScopedSpan<'a> {
    /// Starts a span: records `DurationBegin` immediately.
    pub fn new(
        recorder: &'a TraceRecorder,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let category = category.into();
        let name = name.into();
        recorder.duration_begin(category.clone(), name.clone());
        Self {
            recorder,
            category,
            name,
            arg: None,
        }
    }

    /// Starts a span carrying an argument on both the begin and end events.
    pub fn with_arg(
        recorder: &'a TraceRecorder,
        category: impl Into<String>,
        name: impl Into<String>,
        arg: Arg,
    ) -> Self {
        let category = category.into();
        let name = name.into();
        recorder.duration_begin_with(category.clone(), name.clone(), arg.clone());
        Self {
            recorder,
            category,
            name,
            arg: Some(arg),
        }
    }
}

impl Drop for ScopedSpan<'_> {
    fn drop(&mut self) {
        // Same category/name/argument as captured at construction.
        match self.arg.take() {
            Some(arg) => {
                self.recorder
                    .duration_end_with(self.category.clone(), self.name.clone(), arg);
            }
            None => {
                self.recorder
                    .duration_end(self.category.clone(), self.name.clone());
            }
        }
    }
}
