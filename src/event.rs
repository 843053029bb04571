//! Trace events and argument types.
//!
//! Each event is one record in the output trace: a phase, a category/name
//! pair, a timestamp, the producing process and thread, and at most one
//! typed argument. Events are immutable once constructed; they are written
//! once into the buffer, read exactly once by the drain, and serialized.

use core::fmt;

/// The semantic phase of a trace event.
///
/// Each phase maps to a single-character code in the Chrome Trace Event
/// Format. Async phases use the lowercase codes (`b`/`n`/`e`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Start of a duration span (`B`).
    DurationBegin,
    /// End of a duration span (`E`).
    DurationEnd,
    /// A point-in-time marker (`i`).
    Instant,
    /// A sampled counter value (`C`).
    Counter,
    /// Start of an async sequence (`b`).
    AsyncBegin,
    /// Intermediate step of an async sequence (`n`).
    AsyncStep,
    /// End of an async sequence (`e`).
    AsyncEnd,
    /// Start of a flow arrow (`s`).
    FlowStart,
    /// Intermediate step of a flow (`t`).
    FlowStep,
    /// End of a flow (`f`).
    FlowFinish,
    /// Process/thread metadata (`M`).
    Metadata,
    /// A self-contained span carrying its own duration (`X`).
    Complete,
}

impl Phase {
    /// Returns the single-character wire code for this phase.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::DurationBegin => 'B',
            Self::DurationEnd => 'E',
            Self::Instant => 'i',
            Self::Counter => 'C',
            Self::AsyncBegin => 'b',
            Self::AsyncStep => 'n',
            Self::AsyncEnd => 'e',
            Self::FlowStart => 's',
            Self::FlowStep => 't',
            Self::FlowFinish => 'f',
            Self::Metadata => 'M',
            Self::Complete => 'X',
        }
    }

    /// Returns true if this phase requires a correlation id.
    #[must_use]
    pub const fn requires_correlation_id(self) -> bool {
        matches!(
            self,
            Self::AsyncBegin
                | Self::AsyncStep
                | Self::AsyncEnd
                | Self::FlowStart
                | Self::FlowStep
                | Self::FlowFinish
        )
    }
}

/// Opaque token linking async/flow events into one logical sequence.
///
/// Correlation ids are compared by value and hex-formatted for the wire;
/// they carry no ownership or aliasing semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(u64);

impl CorrelationId {
    /// Creates a correlation id from a raw token value.
    #[must_use]
    pub const fn new(token: u64) -> Self {
        Self(token)
    }

    /// Returns the raw token value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for CorrelationId {
    fn from(token: u64) -> Self {
        Self(token)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// A typed argument value.
///
/// The wire format supports exactly two argument kinds, so this is a closed
/// sum type rather than anything generic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// A signed integer value.
    Int(i64),
    /// A string value (JSON-escaped on serialization).
    Str(String),
}

/// A named, typed event argument. At most one per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    /// Key under which the value appears in the `args` object.
    pub name: String,
    /// The argument value.
    pub value: ArgValue,
}

impl Arg {
    /// Creates an integer argument.
    #[must_use]
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: ArgValue::Int(value),
        }
    }

    /// Creates a string argument.
    #[must_use]
    pub fn str(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ArgValue::Str(value.into()),
        }
    }
}

/// A single trace event.
///
/// Immutable after construction. `timestamp_us` is microseconds since the
/// process-wide monotonic time origin; the sink subtracts the recorder's
/// init-time origin so trace files are relative-time.
#[derive(Debug, Clone)]
pub struct TraceEvent {
    /// Free-form category label.
    pub category: String,
    /// Free-form event name.
    pub name: String,
    /// Correlation token; present exactly for Async*/Flow* phases.
    pub correlation_id: Option<CorrelationId>,
    /// Microseconds since the process time origin.
    pub timestamp_us: u64,
    /// Producing process id.
    pub pid: u32,
    /// Producing thread id (stable hash of the OS thread handle).
    pub tid: u64,
    /// Event phase.
    pub phase: Phase,
    /// Optional typed argument.
    pub arg: Option<Arg>,
    /// Span duration; present only for [`Phase::Complete`].
    pub duration_us: Option<u64>,
}

impl TraceEvent {
    /// Creates an event with no correlation id, argument, or duration.
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        phase: Phase,
        timestamp_us: u64,
        pid: u32,
        tid: u64,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            correlation_id: None,
            timestamp_us,
            pid,
            tid,
            phase,
            arg: None,
            duration_us: None,
        }
    }

    /// Attaches a correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Attaches an argument.
    #[must_use]
    pub fn with_arg(mut self, arg: Arg) -> Self {
        self.arg = Some(arg);
        self
    }

    /// Attaches a duration (for [`Phase::Complete`] events).
    #[must_use]
    pub fn with_duration_us(mut self, duration_us: u64) -> Self {
        self.duration_us = Some(duration_us);
        self
    }
}
