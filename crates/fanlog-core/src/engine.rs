//! fanlog engine - main entry point for logging
//!
//! The [`Engine`] owns one [`Dispatcher`] and one [`SessionId`]. It adds the
//! session banners, the per-severity shortcuts and the ring-buffer queries on
//! top of the raw dispatch API.
//!
//! ## Example
//!
//! ```
//! use fanlog_core::{Engine, Severity, SinkConfig, SinkMask};
//!
//! let engine = Engine::new();
//! engine
//!     .enable(SinkMask::MEMORY, &SinkConfig::default().with_ring_capacity(8))
//!     .unwrap();
//!
//! engine.warn("cache miss");
//! assert_eq!(engine.by_severity(Severity::Warn).len(), 1);
//!
//! engine.disable();
//! ```

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::info;

use crate::config::SinkConfig;
use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::LogResult;
use crate::event::Event;
use crate::sink::{RingBufferSink, Sink};
use crate::types::{CallSite, SessionId, Severity, SinkKind, SinkMask};

/// Caller name recorded on the session banners.
const ENGINE_CALLER: &str = "Engine";

pub struct Engine {
    dispatcher: Dispatcher,
}

impl Engine {
    /// Create an engine with a fresh session id and no sinks.
    pub fn new() -> Self {
        Self::with_session(SessionId::new())
    }

    pub fn with_session(session: SessionId) -> Self {
        info!(%session, "Creating log engine");
        Self {
            dispatcher: Dispatcher::new(session),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        self.dispatcher.session()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Build the sinks in `mask` and announce the session on them.
    pub fn enable(&self, mask: SinkMask, config: &SinkConfig) -> LogResult<()> {
        self.change(mask, config)?;
        info!(session = %self.session_id(), sinks = %mask, "Logging enabled");
        self.banner(&format!("log session started ({})", self.session_id()));
        Ok(())
    }

    /// Replace the active sinks. A failed build leaves the old set running.
    pub fn change(&self, mask: SinkMask, config: &SinkConfig) -> LogResult<()> {
        self.dispatcher.change_sinks(mask, config)
    }

    pub fn remove_sinks(&self, mask: SinkMask) {
        self.dispatcher.remove_sinks(mask);
    }

    /// Announce the end of the session, then drop every sink.
    pub fn disable(&self) {
        self.banner(&format!("log session ended ({})", self.session_id()));
        self.dispatcher.disable();
        info!(session = %self.session_id(), "Logging disabled");
    }

    /// Add a pre-built sink, e.g. one with its own threshold.
    ///
    /// Rings go through [`Engine::install_ring`]; passing one here is
    /// `LogError::InvalidConfig`.
    pub fn install(&self, sink: Arc<dyn Sink>) -> LogResult<()> {
        self.dispatcher.install(sink)
    }

    /// Add a ring with its own threshold and capacity and route queries to it.
    ///
    /// The ring shares the engine's `set_on_event` callback. The returned
    /// handle reads the same buffer the queries do.
    pub fn install_ring(
        &self,
        threshold: Severity,
        capacity: usize,
    ) -> LogResult<Arc<RingBufferSink>> {
        self.dispatcher.install_ring(threshold, capacity)
    }

    pub fn active_sinks(&self) -> Vec<SinkKind> {
        self.dispatcher.active_kinds()
    }

    fn banner(&self, text: &str) {
        self.dispatcher.emit(
            Severity::Info,
            Some(text),
            false,
            CallSite {
                caller: Some(ENGINE_CALLER),
                file: Some(file!()),
                line: Some(line!()),
            },
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Emitting
    // ═══════════════════════════════════════════════════════════════════════

    pub fn emit(
        &self,
        severity: Severity,
        message: Option<&str>,
        detail: bool,
        site: CallSite<'_>,
    ) -> bool {
        self.dispatcher.emit(severity, message, detail, site)
    }

    pub fn emit_report(
        &self,
        severity: Severity,
        message: Option<&str>,
        detail: bool,
        site: CallSite<'_>,
    ) -> DispatchReport {
        self.dispatcher.emit_report(severity, message, detail, site)
    }

    // Shortcuts record file and line through `#[track_caller]` but no
    // function name. Their detail lines render `>> () >>` and `by_caller`
    // never matches them. The `debug!`..`fatal!` macros record the caller.

    #[track_caller]
    pub fn debug(&self, message: &str) -> bool {
        self.emit_here(Severity::Debug, message, Severity::Debug.default_detail())
    }

    #[track_caller]
    pub fn info(&self, message: &str) -> bool {
        self.emit_here(Severity::Info, message, Severity::Info.default_detail())
    }

    #[track_caller]
    pub fn warn(&self, message: &str) -> bool {
        self.emit_here(Severity::Warn, message, Severity::Warn.default_detail())
    }

    #[track_caller]
    pub fn error(&self, message: &str) -> bool {
        self.emit_here(Severity::Error, message, Severity::Error.default_detail())
    }

    #[track_caller]
    pub fn fatal(&self, message: &str) -> bool {
        self.emit_here(Severity::Fatal, message, Severity::Fatal.default_detail())
    }

    #[track_caller]
    pub fn debug_detail(&self, message: &str, detail: bool) -> bool {
        self.emit_here(Severity::Debug, message, detail)
    }

    #[track_caller]
    pub fn info_detail(&self, message: &str, detail: bool) -> bool {
        self.emit_here(Severity::Info, message, detail)
    }

    #[track_caller]
    pub fn warn_detail(&self, message: &str, detail: bool) -> bool {
        self.emit_here(Severity::Warn, message, detail)
    }

    #[track_caller]
    pub fn error_detail(&self, message: &str, detail: bool) -> bool {
        self.emit_here(Severity::Error, message, detail)
    }

    #[track_caller]
    pub fn fatal_detail(&self, message: &str, detail: bool) -> bool {
        self.emit_here(Severity::Fatal, message, detail)
    }

    #[track_caller]
    fn emit_here(&self, severity: Severity, message: &str, detail: bool) -> bool {
        self.dispatcher
            .emit(severity, Some(message), detail, CallSite::here())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Ring buffer queries
    // ═══════════════════════════════════════════════════════════════════════
    //
    // Each query runs under the dispatch lock and returns an empty list if
    // no ring was ever built.

    /// Every held event, oldest first.
    pub fn all(&self) -> Vec<Event> {
        self.query(|ring| ring.snapshot())
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<Event> {
        self.query(|ring| ring.filter_by_severity(severity))
    }

    /// Events with `start <= timestamp <= end`.
    pub fn by_time_range(&self, start: DateTime<Local>, end: DateTime<Local>) -> Vec<Event> {
        self.query(|ring| ring.filter_by_time_range(start, end))
    }

    pub fn by_caller(&self, name: &str) -> Vec<Event> {
        self.query(|ring| ring.filter_by_caller(name))
    }

    /// Events whose source file base name matches `name`.
    pub fn by_file(&self, name: &str) -> Vec<Event> {
        self.query(|ring| ring.filter_by_file(name))
    }

    pub fn clear(&self) {
        self.dispatcher.with_memory(|ring| ring.clear());
    }

    fn query(&self, f: impl FnOnce(&RingBufferSink) -> Vec<Event>) -> Vec<Event> {
        self.dispatcher.with_memory(f).unwrap_or_default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Notification
    // ═══════════════════════════════════════════════════════════════════════

    /// Call `callback` with every event a ring built by this engine accepts.
    ///
    /// The callback survives `change`. It runs on the logging thread with the
    /// dispatch lock held, so it may log or query but should return quickly.
    pub fn set_on_event(&self, callback: impl Fn(&Event) + Send + Sync + 'static) {
        self.dispatcher.notifier().set(Arc::new(callback));
    }

    pub fn clear_on_event(&self) {
        self.dispatcher.notifier().clear();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
