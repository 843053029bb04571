//! Tracer errors.
//!
//! Only administrative calls (`init`, `flush`, `shutdown`) surface errors.
//! Record operations are infallible by policy: tracing must never crash or
//! visibly perturb the instrumented program, so pre-init and post-shutdown
//! records are silent no-ops and buffer overflow is absorbed by the
//! recorder's block-and-flush policy.

use std::io;
use thiserror::Error;

/// Errors surfaced by recorder administrative calls.
#[derive(Debug, Error)]
pub enum TraceError {
    /// `init` was called on a recorder that was already initialized
    /// (or already shut down).
    #[error("trace recorder already initialized")]
    AlreadyInitialized,

    /// Opening or writing the trace file failed.
    #[error("trace sink I/O error: {source}")]
    Sink {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },
}
