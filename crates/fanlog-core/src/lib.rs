//! fanlog Core Library
//!
//! Fan-out logging with per-sink thresholds and a queryable in-memory ring.
//!
//! ## Overview
//!
//! One log call is timestamped, formatted once and handed to every active
//! sink. Each sink applies its own minimum severity. Text sinks (terminal,
//! `tracing` channel, file) get the formatted line; the ring buffer and the
//! redb store get the structured [`Event`]. The call reports `true` only if
//! every sink accepted the event.
//!
//! ```text
//!  engine.error("disk full")
//!          │
//!          ▼
//!   ┌─────────────┐     ┌──────────────┐
//!   │ Dispatcher  │────►│ TerminalSink │  line
//!   │ (reentrant  │────►│ DebugChannel │  line
//!   │  lock)      │────►│ FileSink     │  line
//!   │             │────►│ RingBuffer   │  Event ──► on_event callback
//!   │             │────►│ Relational   │  Event ──► redb sessions/logs
//!   └─────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use fanlog_core::{Engine, Severity, SinkConfig, SinkMask};
//!
//! let engine = Engine::new();
//! let config = SinkConfig::default()
//!     .with_level(Severity::Error)
//!     .with_ring_capacity(2);
//! engine.enable(SinkMask::MEMORY, &config).unwrap();
//!
//! engine.debug("a");
//! engine.info("b");
//! engine.error("c");
//! engine.error("d");
//! engine.error("e");
//!
//! let held: Vec<_> = engine.all().iter().map(|e| e.message().unwrap().to_string()).collect();
//! assert_eq!(held, ["d", "e"]);
//! ```

use std::sync::OnceLock;

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod sink;
pub mod store;
pub mod types;

mod macros;

// Re-exports
pub use config::SinkConfig;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use engine::Engine;
pub use error::{LogError, LogResult};
pub use event::Event;
pub use sink::{ColorMode, Sink, SinkOutcome};
pub use store::{LogQuery, LogRow, LogStore, SessionRow};
pub use types::*;

static GLOBAL: OnceLock<Engine> = OnceLock::new();

/// Process-wide engine, created with no sinks on first use.
pub fn global() -> &'static Engine {
    GLOBAL.get_or_init(Engine::new)
}
