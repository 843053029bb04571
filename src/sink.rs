//! Trace file sink: wire serialization and file framing.
//!
//! The sink owns the output stream exclusively; only the drain path touches
//! it. Each event becomes one JSON object with keys in a fixed order
//! (`cat`, `pid`, `tid`, `ts`, `ph`, `name`, optional `id`, optional `dur`,
//! `args`). String fields go through `serde_json`, so names, categories,
//! and string arguments are always correctly escaped.
//!
//! File framing:
//!
//! ```text
//! {"traceEvents":[
//! {...},{...},{...}
//! ]}
//! ```

use crate::event::{ArgValue, TraceEvent};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Serializes events into the Chrome Trace Event JSON stream.
///
/// Generic over the output so unit tests can drive an in-memory writer;
/// the production path is `TraceSink<BufWriter<File>>`.
#[derive(Debug)]
pub struct TraceSink<W: Write> {
    writer: W,
    /// Time origin subtracted from every timestamp, in microseconds.
    origin_us: u64,
    /// Whether the first event has been written (controls separators).
    first_written: bool,
}

impl TraceSink<BufWriter<File>> {
    /// Creates the trace file at `path` and writes the opening framing.
    pub fn create(path: impl AsRef<Path>, origin_us: u64) -> io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), origin_us)
    }
}

impl<W: Write> TraceSink<W> {
    /// Wraps an output stream and writes the opening framing.
    pub fn new(mut writer: W, origin_us: u64) -> io::Result<Self> {
        writer.write_all(b"{\"traceEvents\":[\n")?;
        Ok(Self {
            writer,
            origin_us,
            first_written: false,
        })
    }

    /// Serializes one event and appends it to the stream.
    pub fn write_event(&mut self, event: &TraceEvent) -> io::Result<()> {
        if self.first_written {
            self.writer.write_all(b",")?;
        }
        let wire = WireEvent::from_event(event, self.origin_us);
        serde_json::to_writer(&mut self.writer, &wire)?;
        self.first_written = true;
        Ok(())
    }

    /// Flushes buffered output to the underlying stream.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Writes the closing framing and flushes.
    ///
    /// The sink must not be used after this call.
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.write_all(b"\n]}\n")?;
        self.writer.flush()
    }
}

/// Borrowed view of an event in wire-format field order.
struct WireEvent<'a> {
    event: &'a TraceEvent,
    ts: u64,
}

impl<'a> WireEvent<'a> {
    fn from_event(event: &'a TraceEvent, origin_us: u64) -> Self {
        Self {
            event,
            ts: event.timestamp_us.saturating_sub(origin_us),
        }
    }
}

impl Serialize for WireEvent<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let event = self.event;
        let mut len = 7;
        if event.correlation_id.is_some() {
            len += 1;
        }
        if event.duration_us.is_some() {
            len += 1;
        }

        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("cat", &event.category)?;
        map.serialize_entry("pid", &event.pid)?;
        map.serialize_entry("tid", &event.tid)?;
        map.serialize_entry("ts", &self.ts)?;
        map.serialize_entry("ph", &event.phase.code())?;
        map.serialize_entry("name", &event.name)?;
        if let Some(id) = event.correlation_id {
            map.serialize_entry("id", &id.to_string())?;
        }
        if let Some(dur) = event.duration_us {
            map.serialize_entry("dur", &dur)?;
        }
        map.serialize_entry("args", &WireArgs(&event.arg))?;
        map.end()
    }
}

/// The `args` object: empty, or one key/value pair.
struct WireArgs<'a>(&'a Option<crate::event::Arg>);

impl Serialize for WireArgs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            None => serializer.serialize_map(Some(0))?.end(),
            Some(arg) => {
                let mut map = serializer.serialize_map(Some(1))?;
                match &arg.value {
                    ArgValue::Int(v) => map.serialize_entry(&arg.name, v)?,
                    ArgValue::Str(v) => map.serialize_entry(&arg.name, v)?,
                }
                map.end()
            }
        }
    }
}
