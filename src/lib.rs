//! In-process event tracer emitting the Chrome Trace Event JSON format.
//!
//! Application threads record span and marker events through a
//! [`TraceRecorder`]; the recorder buffers them in a bounded
//! [`EventBuffer`] and periodically drains them through a [`TraceSink`]
//! into a trace file readable by `chrome://tracing`, Perfetto, and
//! compatible viewers.
//!
//! # Quick start
//!
//! ```ignore
//! use tracekit::{global, MetadataKind, ScopedSpan};
//!
//! fn main() -> Result<(), tracekit::TraceError> {
//!     global().init("trace.json")?;
//!     global().metadata(MetadataKind::ProcessName, "my-app");
//!
//!     {
//!         let _span = ScopedSpan::new(global(), "io", "read");
//!         // ... traced work ...
//!     }
//!     global().counter("main", "queue_depth", 3);
//!
//!     global().shutdown()
//! }
//! ```
//!
//! # Guarantees
//!
//! - Record operations never fail visibly and never perform file I/O
//!   inline; writes happen only inside a drain.
//! - Overflow policy is block-and-flush: a producer hitting a full buffer
//!   drains it synchronously and retries, so no event is lost while
//!   tracing.
//! - If the sink opened successfully and `shutdown` completes normally,
//!   the output file is valid JSON.
//!
//! # Modules
//!
//! - [`event`]: the event data model (phases, arguments, correlation ids)
//! - [`buffer`]: bounded concurrent event buffer
//! - [`recorder`]: process-wide recorder and record operations
//! - [`sink`]: wire serialization and file framing
//! - [`span`]: RAII scope spans
//! - [`error`]: error types

pub mod buffer;
pub mod error;
pub mod event;
pub mod recorder;
pub mod sink;
pub mod span;

pub use buffer::EventBuffer;
pub use error::TraceError;
pub use event::{Arg, ArgValue, CorrelationId, Phase, TraceEvent};
pub use recorder::{global, MetadataKind, RecorderConfig, TraceRecorder, DEFAULT_BUFFER_CAPACITY};
pub use sink::TraceSink;
pub use span::ScopedSpan;
