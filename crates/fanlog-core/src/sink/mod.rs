//! Sink abstraction and the built-in sinks.
//!
//! ## Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Sink: one backend with its own minimum severity                 │
//! │  ├── TerminalSink      formatted line → colored stdout           │
//! │  ├── DebugChannelSink  formatted line → tracing (fanlog::channel)│
//! │  ├── FileSink          formatted line → append-only file         │
//! │  ├── RingBufferSink    structured event → fixed-size ring        │
//! │  └── RelationalSink    structured event → redb session/log rows  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sinks never return errors from a write. A write either lands
//! ([`SinkOutcome::Accepted`]), is skipped because the event is below the
//! sink's threshold ([`SinkOutcome::Filtered`]), or fails for a reason that
//! is carried as text ([`SinkOutcome::Failed`]).

use std::fmt;

use crate::event::Event;
use crate::format::render_line;
use crate::types::{Severity, SinkKind};

pub mod channel;
pub mod file;
pub mod relational;
pub mod ring;
pub mod terminal;

pub use channel::DebugChannelSink;
pub use file::FileSink;
pub use relational::RelationalSink;
pub use ring::{EventCallback, Notifier, RingBufferSink};
pub use terminal::{ColorMode, TerminalSink};

/// What the dispatcher hands to a sink.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// The shared pre-formatted line, for text sinks
    Line { line: &'a str, severity: Severity },
    /// The structured event, for sinks that keep provenance separately
    Event(&'a Event),
}

impl Payload<'_> {
    pub fn severity(&self) -> Severity {
        match self {
            Payload::Line { severity, .. } => *severity,
            Payload::Event(event) => event.severity(),
        }
    }

    /// Text form of the payload; structured events render without detail.
    pub fn to_line(&self) -> String {
        match self {
            Payload::Line { line, .. } => (*line).to_string(),
            Payload::Event(event) => render_line(event, false),
        }
    }
}

/// Result of handing one payload to one sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    /// The sink recorded the event
    Accepted,
    /// The event was below the sink's threshold
    Filtered,
    /// The sink tried and failed
    Failed(String),
}

impl SinkOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SinkOutcome::Accepted)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SinkOutcome::Failed(_))
    }
}

impl fmt::Display for SinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkOutcome::Accepted => write!(f, "accepted"),
            SinkOutcome::Filtered => write!(f, "filtered"),
            SinkOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// A log backend.
///
/// Implementations must tolerate concurrent calls even though the
/// dispatcher serializes them; sinks can also be driven directly.
pub trait Sink: Send + Sync {
    /// Kind tag used for removal and for choosing the payload shape
    fn kind(&self) -> SinkKind;

    /// Minimum severity this sink records
    fn threshold(&self) -> Severity;

    /// Record one payload.
    fn write(&self, payload: Payload<'_>) -> SinkOutcome;

    /// Whether the dispatcher should log this sink's failures back through
    /// the Error-severity emit path
    fn reports_failures(&self) -> bool {
        false
    }

    fn accepts(&self, severity: Severity) -> bool {
        severity >= self.threshold()
    }
}

impl fmt::Debug for dyn Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("kind", &self.kind())
            .field("threshold", &self.threshold())
            .finish()
    }
}
