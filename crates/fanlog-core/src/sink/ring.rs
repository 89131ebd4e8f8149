//! Fixed-capacity in-memory ring of events with change notification.
//!
//! ## Layout
//!
//! ```text
//! capacity = 5, seven writes E1..E7
//!
//!   slots:  [E6] [E7] [E3] [E4] [E5]
//!                      ▲
//!                 write_index = 2, full = true
//!
//!   snapshot = slots[2..5] ++ slots[0..2] = E3 E4 E5 E6 E7
//! ```
//!
//! Until the index first wraps, the populated slots are `[0, write_index)`
//! in insertion order. After it wraps, the slot at `write_index` is always
//! the oldest survivor, so chronological order is recovered from
//! `(write_index, full)` alone without storing sequence numbers.

use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::{Payload, Sink, SinkOutcome};
use crate::error::{LogError, LogResult};
use crate::event::Event;
use crate::types::{Severity, SinkKind};

/// Callback invoked with every event a ring accepts.
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Shared slot holding the current event callback.
///
/// A notifier outlives individual rings: the engine hands the same notifier
/// to every ring it builds, so a callback registered before `change` keeps
/// firing for the replacement ring.
#[derive(Clone, Default)]
pub struct Notifier {
    slot: Arc<RwLock<Option<EventCallback>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, callback: EventCallback) {
        *self.slot.write() = Some(callback);
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Invoke the callback, if any. The slot lock is released before the
    /// call so the callback may replace itself.
    pub fn notify(&self, event: &Event) {
        let callback = self.slot.read().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("is_set", &self.is_set())
            .finish()
    }
}

/// Circular storage backing a [`RingBufferSink`].
#[derive(Debug)]
struct Ring {
    slots: Vec<Option<Event>>,
    write_index: usize,
    full: bool,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            write_index: 0,
            full: false,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, event: Event) {
        self.slots[self.write_index] = Some(event);
        self.write_index = (self.write_index + 1) % self.capacity();
        if self.write_index == 0 {
            self.full = true;
        }
    }

    fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            self.write_index
        }
    }

    /// Oldest first.
    fn snapshot(&self) -> Vec<Event> {
        let (older, newer) = if self.full {
            (&self.slots[self.write_index..], &self.slots[..self.write_index])
        } else {
            (&self.slots[..self.write_index], &self.slots[..0])
        };

        older.iter().chain(newer).flatten().cloned().collect()
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.write_index = 0;
        self.full = false;
    }
}

/// In-memory sink keeping the most recent `capacity` accepted events.
///
/// ```
/// use fanlog_core::sink::RingBufferSink;
/// use fanlog_core::{Event, Severity};
///
/// let ring = RingBufferSink::new(Severity::Debug, 3).unwrap();
/// for n in 1..=5 {
///     ring.accept(&Event::new(Severity::Info, format!("E{n}")));
/// }
/// let messages: Vec<_> = ring
///     .snapshot()
///     .iter()
///     .map(|e| e.message().unwrap().to_string())
///     .collect();
/// assert_eq!(messages, ["E3", "E4", "E5"]);
/// ```
#[derive(Debug)]
pub struct RingBufferSink {
    threshold: Severity,
    ring: Mutex<Ring>,
    notifier: Notifier,
}

impl RingBufferSink {
    /// Create a ring with its own notifier.
    ///
    /// # Errors
    ///
    /// Returns `LogError::InvalidConfig` if `capacity` is zero.
    pub fn new(threshold: Severity, capacity: usize) -> LogResult<Self> {
        Self::with_notifier(threshold, capacity, Notifier::new())
    }

    /// Create a ring that reports accepted events through `notifier`.
    pub fn with_notifier(
        threshold: Severity,
        capacity: usize,
        notifier: Notifier,
    ) -> LogResult<Self> {
        if capacity == 0 {
            return Err(LogError::InvalidConfig(
                "ring buffer capacity must be greater than zero".to_string(),
            ));
        }

        debug!(capacity, %threshold, "Creating ring buffer sink");

        Ok(Self {
            threshold,
            ring: Mutex::new(Ring::new(capacity)),
            notifier,
        })
    }

    pub fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the write index has wrapped since the last clear.
    pub fn is_full(&self) -> bool {
        self.ring.lock().full
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Register the change-notification callback.
    pub fn set_on_event(&self, callback: impl Fn(&Event) + Send + Sync + 'static) {
        self.notifier.set(Arc::new(callback));
    }

    /// Store `event` if it meets the threshold, then notify.
    ///
    /// Returns `false` for events below the threshold. The callback runs on
    /// the writer's thread after the slot is written; a slow callback delays
    /// the writer.
    pub fn accept(&self, event: &Event) -> bool {
        if !self.accepts(event.severity()) {
            return false;
        }

        self.ring.lock().push(event.clone());
        self.notifier.notify(event);
        true
    }

    /// All held events, oldest first.
    pub fn snapshot(&self) -> Vec<Event> {
        self.ring.lock().snapshot()
    }

    /// Held events with exactly this severity.
    pub fn filter_by_severity(&self, severity: Severity) -> Vec<Event> {
        self.filtered(|event| event.severity() == severity)
    }

    /// Held events with `start <= timestamp <= end`.
    pub fn filter_by_time_range(&self, start: DateTime<Local>, end: DateTime<Local>) -> Vec<Event> {
        self.filtered(|event| event.timestamp() >= start && event.timestamp() <= end)
    }

    /// Held events whose caller matches `name`, ignoring case.
    pub fn filter_by_caller(&self, name: &str) -> Vec<Event> {
        self.filtered(|event| {
            event
                .caller()
                .is_some_and(|caller| caller.eq_ignore_ascii_case(name))
        })
    }

    /// Held events whose source file name matches `name`, ignoring case.
    pub fn filter_by_file(&self, name: &str) -> Vec<Event> {
        self.filtered(|event| {
            event
                .file_name()
                .is_some_and(|file| file.eq_ignore_ascii_case(name))
        })
    }

    /// Drop every held event and reset the write position.
    pub fn clear(&self) {
        self.ring.lock().clear();
    }

    fn filtered(&self, predicate: impl Fn(&Event) -> bool) -> Vec<Event> {
        self.snapshot().into_iter().filter(|e| predicate(e)).collect()
    }
}

impl Sink for RingBufferSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Memory
    }

    fn threshold(&self) -> Severity {
        self.threshold
    }

    fn write(&self, payload: Payload<'_>) -> SinkOutcome {
        match payload {
            Payload::Event(event) => {
                if self.accept(event) {
                    SinkOutcome::Accepted
                } else {
                    SinkOutcome::Filtered
                }
            }
            Payload::Line { .. } => {
                SinkOutcome::Failed("ring buffer only stores structured events".to_string())
            }
        }
    }
}
