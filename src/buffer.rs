//! Bounded event buffer between emission and drain.
//!
//! Producers append under a short critical section; the drain swaps the
//! active container for a pre-allocated empty one under the same lock. The
//! shared mutex is the quiescence barrier: a swap cannot start while any
//! append's critical section is in flight, so a drained container is never
//! appended to and a half-written slot is never observed.
//!
//! The buffer never drops or overwrites events itself. When it is full,
//! `try_append` fails and the caller's overflow policy applies (the
//! recorder drains synchronously and retries).

use crate::event::TraceEvent;
use parking_lot::Mutex;

/// A bounded, concurrency-safe holding area for trace events.
///
/// Capacity is fixed at construction; there is no dynamic growth.
#[derive(Debug)]
pub struct EventBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

#[derive(Debug)]
struct Inner {
    /// Active container, in emission order.
    events: Vec<TraceEvent>,
}

impl EventBuffer {
    /// Creates a buffer holding at most `capacity` events.
    ///
    /// A capacity of zero is clamped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                events: Vec::with_capacity(capacity),
            }),
            capacity,
        }
    }

    /// Returns the fixed capacity of the buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    /// Returns true if no events are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts to append one event.
    ///
    /// Returns false when the buffer is full. Never blocks on I/O; the
    /// critical section is a bounded in-memory push. Safe for concurrent
    /// invocation from any number of producer threads.
    pub fn try_append(&self, event: TraceEvent) -> bool {
        let mut inner = self.inner.lock();
        if inner.events.len() == self.capacity {
            return false;
        }
        inner.events.push(event);
        true
    }

    /// Atomically claims all buffered events in FIFO emission order.
    ///
    /// The buffer is left empty with its full capacity available and no
    /// reallocation on the producer side.
    #[must_use]
    pub fn drain_all(&self) -> Vec<TraceEvent> {
        let mut inner = self.inner.lock();
        std::mem::replace(&mut inner.events, Vec::with_capacity(self.capacity))
    }
}
