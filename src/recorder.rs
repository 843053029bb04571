//! Process-wide trace recorder.
//!
//! The [`TraceRecorder`] is the only entry point instrumented code uses,
//! directly or through [`ScopedSpan`](crate::span::ScopedSpan). It owns the
//! [`EventBuffer`] and the output sink and coordinates producers with the
//! drain path.
//!
//! # Lifecycle
//!
//! `Uninitialized → Tracing → Closed`. Record operations outside `Tracing`
//! are silent no-ops: tracing must never crash or visibly perturb the host
//! program. `init` and `shutdown` are explicit administrative calls and may
//! surface errors.
//!
//! # Overflow policy
//!
//! Block-and-flush: when the buffer is full, the appending thread drains it
//! synchronously and retries. No event is ever dropped while tracing; the
//! cost is producer-side latency proportional to one drain on the thread
//! that hits the boundary.
//!
//! # Usage
//!
//! ```ignore
//! use tracekit::{global, ScopedSpan};
//!
//! global().init("trace.json")?;
//! {
//!     let _span = ScopedSpan::new(global(), "io", "read");
//!     // ... traced work ...
//! }
//! global().shutdown()?;
//! ```

use crate::buffer::EventBuffer;
use crate::error::TraceError;
use crate::event::{Arg, CorrelationId, Phase, TraceEvent};
use crate::sink::TraceSink;
use parking_lot::Mutex;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default event buffer capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1_000_000;

// Recorder lifecycle states, stored in an AtomicU8.
const STATE_UNINITIALIZED: u8 = 0;
const STATE_TRACING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Fixed metadata event names accepted by the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    /// Names the producing process in the trace viewer.
    ProcessName,
    /// Names the producing thread in the trace viewer.
    ThreadName,
}

impl MetadataKind {
    /// Returns the wire-format event name.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::ProcessName => "process_name",
            Self::ThreadName => "thread_name",
        }
    }
}

/// Configuration for a trace recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Event buffer capacity. Clamped to at least 1.
    pub buffer_capacity: usize,
}

impl RecorderConfig {
    /// Sets the event buffer capacity.
    #[must_use]
    pub const fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Records trace events from any thread and drains them to a trace file.
///
/// All record operations take `&self` and are safe to call concurrently
/// without caller-side locking. At most one drain runs at a time; drains
/// serialize on the sink-side mutex.
#[derive(Debug)]
pub struct TraceRecorder {
    /// Lifecycle state (`STATE_*` constants).
    state: AtomicU8,
    /// Bounded holding area shared by producers and the drain path.
    buffer: EventBuffer,
    /// Output sink, owned exclusively by the drain path.
    ///
    /// Doubles as the flush-side lock: holding it serializes drains, so
    /// drained batches are written without interleaving.
    sink: Mutex<Option<TraceSink<BufWriter<File>>>>,
    /// Time origin captured at `init`, in microseconds since process start.
    origin_us: AtomicU64,
    /// Producing process id, captured once.
    pid: u32,
}

impl TraceRecorder {
    /// Creates an uninitialized recorder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RecorderConfig::default())
    }

    /// Creates an uninitialized recorder with a custom configuration.
    #[must_use]
    pub fn with_config(config: RecorderConfig) -> Self {
        Self {
            state: AtomicU8::new(STATE_UNINITIALIZED),
            buffer: EventBuffer::new(config.buffer_capacity),
            sink: Mutex::new(None),
            origin_us: AtomicU64::new(0),
            pid: std::process::id(),
        }
    }

    /// Returns true if the recorder is currently tracing.
    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_TRACING
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens the trace file and starts tracing.
    ///
    /// Writes the opening framing and captures the time origin, so the
    /// first events have timestamps near zero.
    ///
    /// # Errors
    ///
    /// [`TraceError::AlreadyInitialized`] if the recorder was already
    /// initialized (or shut down); [`TraceError::Sink`] if the file cannot
    /// be created, in which case the recorder stays uninitialized and
    /// `init` may be retried.
    pub fn init(&self, path: impl AsRef<Path>) -> Result<(), TraceError> {
        if self
            .state
            .compare_exchange(
                STATE_UNINITIALIZED,
                STATE_TRACING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(TraceError::AlreadyInitialized);
        }

        let origin = now_micros();
        match TraceSink::create(path.as_ref(), origin) {
            Ok(sink) => {
                self.origin_us.store(origin, Ordering::Release);
                *self.sink.lock() = Some(sink);
                debug!(path = %path.as_ref().display(), "trace recorder initialized");
                Ok(())
            }
            Err(err) => {
                self.state.store(STATE_UNINITIALIZED, Ordering::Release);
                Err(TraceError::Sink { source: err })
            }
        }
    }

    /// Drains all buffered events and writes them synchronously.
    ///
    /// Idempotent and safe to call concurrently with producers; only events
    /// present at the moment of the drain swap are guaranteed written. A
    /// no-op `Ok(())` when the recorder is not tracing.
    ///
    /// # Errors
    ///
    /// [`TraceError::Sink`] if writing the trace file fails. Tracing
    /// continues best-effort after a failed flush.
    pub fn flush(&self) -> Result<(), TraceError> {
        let mut sink = self.sink.lock();
        Self::drain_into(&self.buffer, sink.as_mut())
    }

    /// Stops tracing: final drain, closing framing, sink closed.
    ///
    /// Idempotent, and safe to call concurrently with in-flight record
    /// operations: events racing with shutdown either land in the final
    /// drain or are dropped as no-ops, never corrupting state.
    ///
    /// # Errors
    ///
    /// [`TraceError::Sink`] if the final write fails. The recorder is
    /// closed either way.
    pub fn shutdown(&self) -> Result<(), TraceError> {
        let previous = self.state.swap(STATE_CLOSED, Ordering::AcqRel);
        if previous != STATE_TRACING {
            return Ok(());
        }

        let mut sink = self.sink.lock();
        let drained = Self::drain_into(&self.buffer, sink.as_mut());
        let finished = match sink.as_mut() {
            Some(sink) => sink.finish().map_err(TraceError::from),
            None => Ok(()),
        };
        *sink = None;
        debug!("trace recorder closed");
        drained.and(finished)
    }

    /// Drains the buffer through the sink. Caller holds the sink lock.
    fn drain_into(
        buffer: &EventBuffer,
        sink: Option<&mut TraceSink<BufWriter<File>>>,
    ) -> Result<(), TraceError> {
        let Some(sink) = sink else {
            return Ok(());
        };
        let events = buffer.drain_all();
        let count = events.len();
        for event in &events {
            sink.write_event(event)?;
        }
        sink.flush()?;
        debug!(count, "drained trace events");
        Ok(())
    }

    // =========================================================================
    // Record operations — durations
    // =========================================================================

    /// Records the start of a duration span.
    pub fn duration_begin(&self, category: impl Into<String>, name: impl Into<String>) {
        self.record(self.event(category, name, Phase::DurationBegin));
    }

    /// Records the start of a duration span with an argument.
    pub fn duration_begin_with(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        arg: Arg,
    ) {
        self.record(self.event(category, name, Phase::DurationBegin).with_arg(arg));
    }

    /// Records the end of a duration span.
    pub fn duration_end(&self, category: impl Into<String>, name: impl Into<String>) {
        self.record(self.event(category, name, Phase::DurationEnd));
    }

    /// Records the end of a duration span with an argument.
    pub fn duration_end_with(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        arg: Arg,
    ) {
        self.record(self.event(category, name, Phase::DurationEnd).with_arg(arg));
    }

    /// Records a self-contained span that ended now and lasted `duration`.
    ///
    /// The event's timestamp is the start of the interval.
    pub fn complete(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        duration: Duration,
    ) {
        let duration_us = duration.as_micros() as u64;
        let now = now_micros();
        let mut event = self.event(category, name, Phase::Complete);
        event.timestamp_us = now.saturating_sub(duration_us);
        self.record(event.with_duration_us(duration_us));
    }

    // =========================================================================
    // Record operations — markers
    // =========================================================================

    /// Records a point-in-time marker.
    pub fn instant(&self, category: impl Into<String>, name: impl Into<String>) {
        self.record(self.event(category, name, Phase::Instant));
    }

    /// Records a counter sample. The value is serialized as an argument
    /// named after the event name.
    pub fn counter(&self, category: impl Into<String>, name: impl Into<String>, value: i64) {
        let name = name.into();
        let arg = Arg::int(name.clone(), value);
        self.record(self.event(category, name, Phase::Counter).with_arg(arg));
    }

    /// Records process/thread naming metadata.
    pub fn metadata(&self, kind: MetadataKind, value: impl Into<String>) {
        let arg = Arg::str("name", value);
        self.record(self.event("", kind.event_name(), Phase::Metadata).with_arg(arg));
    }

    // =========================================================================
    // Record operations — async sequences
    // =========================================================================

    /// Records the start of an async sequence.
    pub fn async_begin(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
    ) {
        self.record(
            self.event(category, name, Phase::AsyncBegin)
                .with_correlation_id(id),
        );
    }

    /// Records the start of an async sequence with an argument.
    pub fn async_begin_with(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
        arg: Arg,
    ) {
        self.record(
            self.event(category, name, Phase::AsyncBegin)
                .with_correlation_id(id)
                .with_arg(arg),
        );
    }

    /// Records an intermediate step of an async sequence.
    pub fn async_step(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
        step: impl Into<String>,
    ) {
        self.record(
            self.event(category, name, Phase::AsyncStep)
                .with_correlation_id(id)
                .with_arg(Arg::str("step", step)),
        );
    }

    /// Records the end of an async sequence.
    pub fn async_end(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
    ) {
        self.record(
            self.event(category, name, Phase::AsyncEnd)
                .with_correlation_id(id),
        );
    }

    /// Records the end of an async sequence with an argument.
    pub fn async_end_with(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
        arg: Arg,
    ) {
        self.record(
            self.event(category, name, Phase::AsyncEnd)
                .with_correlation_id(id)
                .with_arg(arg),
        );
    }

    // =========================================================================
    // Record operations — flows
    // =========================================================================

    /// Records the start of a flow.
    pub fn flow_start(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
    ) {
        self.record(
            self.event(category, name, Phase::FlowStart)
                .with_correlation_id(id),
        );
    }

    /// Records the start of a flow with an argument.
    pub fn flow_start_with(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
        arg: Arg,
    ) {
        self.record(
            self.event(category, name, Phase::FlowStart)
                .with_correlation_id(id)
                .with_arg(arg),
        );
    }

    /// Records an intermediate step of a flow.
    pub fn flow_step(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
        step: impl Into<String>,
    ) {
        self.record(
            self.event(category, name, Phase::FlowStep)
                .with_correlation_id(id)
                .with_arg(Arg::str("step", step)),
        );
    }

    /// Records the end of a flow.
    pub fn flow_finish(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
    ) {
        self.record(
            self.event(category, name, Phase::FlowFinish)
                .with_correlation_id(id),
        );
    }

    /// Records the end of a flow with an argument.
    pub fn flow_finish_with(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        id: CorrelationId,
        arg: Arg,
    ) {
        self.record(
            self.event(category, name, Phase::FlowFinish)
                .with_correlation_id(id)
                .with_arg(arg),
        );
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn event(
        &self,
        category: impl Into<String>,
        name: impl Into<String>,
        phase: Phase,
    ) -> TraceEvent {
        TraceEvent::new(
            category,
            name,
            phase,
            now_micros(),
            self.pid,
            current_thread_id(),
        )
    }

    /// Appends one event, draining synchronously when the buffer is full.
    ///
    /// Never returns an error to the caller: flush failures inside the
    /// overflow path are logged and the event is still appended, so a bad
    /// disk degrades the trace rather than the host program.
    fn record(&self, event: TraceEvent) {
        // Re-checked each iteration: a shutdown racing with this call must
        // turn it into a no-op rather than leave it spinning on a full
        // buffer nobody will drain.
        while self.is_tracing() {
            if self.buffer.try_append(event.clone()) {
                return;
            }
            // Overflow: block this producer on a synchronous drain.
            if let Err(err) = self.flush() {
                warn!(error = %err, "trace drain failed; retrying append");
            }
        }
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TraceRecorder {
    fn drop(&mut self) {
        // Final close for owned instances; errors are best-effort here.
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "trace recorder shutdown failed during drop");
        }
    }
}

// =============================================================================
// Process-wide handle and clocks
// =============================================================================

static GLOBAL: OnceLock<TraceRecorder> = OnceLock::new();

/// Returns the process-wide recorder handle.
///
/// Constructed lazily on first use with the default configuration; the
/// instance lives for the rest of the process. Call
/// [`TraceRecorder::shutdown`] at teardown to finalize the trace file.
pub fn global() -> &'static TraceRecorder {
    GLOBAL.get_or_init(TraceRecorder::new)
}

static TIME_ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Monotonic microseconds since the process time origin.
///
/// The origin is captured once, on first use, so timestamps are comparable
/// across threads for the lifetime of the process.
pub(crate) fn now_micros() -> u64 {
    let origin = TIME_ORIGIN.get_or_init(Instant::now);
    origin.elapsed().as_micros() as u64
}

/// Stable identifier for the calling thread.
pub(crate) fn current_thread_id() -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_micros_is_monotonic() {
        let a = now_micros();
        let b = now_micros();
        assert!(b >= a);
    }

    #[test]
    fn thread_ids_are_stable_and_distinct() {
        let here = current_thread_id();
        assert_eq!(here, current_thread_id());

        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }

    #[test]
    fn record_before_init_is_a_noop() {
        let recorder = TraceRecorder::new();
        recorder.duration_begin("io", "read");
        recorder.counter("main", "greebles", 5);
        assert!(!recorder.is_tracing());
        assert!(recorder.buffer.is_empty());
    }

    #[test]
    fn flush_before_init_is_ok() {
        let recorder = TraceRecorder::new();
        assert!(recorder.flush().is_ok());
    }

    #[test]
    fn shutdown_without_init_is_ok_and_idempotent() {
        let recorder = TraceRecorder::new();
        assert!(recorder.shutdown().is_ok());
        assert!(recorder.shutdown().is_ok());
        assert!(!recorder.is_tracing());
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = TraceRecorder::new();
        recorder.init(dir.path().join("trace.json")).unwrap();
        assert!(matches!(
            recorder.init(dir.path().join("other.json")),
            Err(TraceError::AlreadyInitialized)
        ));
        recorder.shutdown().unwrap();
    }

    #[test]
    fn init_after_shutdown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = TraceRecorder::new();
        recorder.init(dir.path().join("trace.json")).unwrap();
        recorder.shutdown().unwrap();
        assert!(matches!(
            recorder.init(dir.path().join("again.json")),
            Err(TraceError::AlreadyInitialized)
        ));
    }

    #[test]
    fn init_failure_leaves_recorder_reusable() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = TraceRecorder::new();
        // A directory path cannot be created as a file.
        assert!(matches!(
            recorder.init(dir.path()),
            Err(TraceError::Sink { .. })
        ));
        assert!(!recorder.is_tracing());
        recorder.init(dir.path().join("trace.json")).unwrap();
        assert!(recorder.is_tracing());
        recorder.shutdown().unwrap();
    }

    #[test]
    fn record_after_shutdown_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = TraceRecorder::new();
        recorder.init(dir.path().join("trace.json")).unwrap();
        recorder.shutdown().unwrap();
        recorder.instant("late", "marker");
        assert!(recorder.buffer.is_empty());
    }

    #[test]
    fn metadata_kind_event_names() {
        assert_eq!(MetadataKind::ProcessName.event_name(), "process_name");
        assert_eq!(MetadataKind::ThreadName.event_name(), "thread_name");
    }
}
