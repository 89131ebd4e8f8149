//! Fan-out of one log call to every active sink.
//!
//! ## Locking
//!
//! ```text
//! emit ──► ReentrantMutex<DispatchState> ─┬─► snapshot Arc<dyn Sink> list
//!                                          ├─► sink 1 ─► outcome
//!                                          ├─► sink 2 ─► Failed ─► emit(Error) (depth 1)
//!                                          └─► sink n ─► outcome
//! ```
//!
//! One re-entrant mutex orders every emit, every sink-set mutation and every
//! ring query. Re-entrancy lets a sink failure or a ring callback log again on
//! the same thread. The sink list is cloned before fan-out, so a callback that
//! changes the set from inside a dispatch affects the next call, not the
//! current one.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, info, warn};

use crate::config::SinkConfig;
use crate::error::{LogError, LogResult};
use crate::event::Event;
use crate::format::render_line;
use crate::sink::{
    DebugChannelSink, FileSink, Notifier, Payload, RelationalSink, RingBufferSink, Sink,
    SinkOutcome, TerminalSink,
};
use crate::types::{CallSite, SessionId, Severity, SinkKind, SinkMask};

/// Nested emits allowed for reporting sink failures.
pub const MAX_FAILURE_DEPTH: u32 = 1;

/// Caller recorded on the Error event that reports a sink failure.
pub const FAILURE_CALLER: &str = "Dispatcher::emit_report";

/// Per-sink results of one dispatch, in fan-out order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    outcomes: Vec<(SinkKind, SinkOutcome)>,
}

impl DispatchReport {
    pub fn outcomes(&self) -> &[(SinkKind, SinkOutcome)] {
        &self.outcomes
    }

    /// No sink was active.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// At least one sink was active and every one accepted.
    pub fn accepted_all(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|(_, o)| o.is_accepted())
    }

    pub fn failures(&self) -> impl Iterator<Item = (SinkKind, &str)> + '_ {
        self.outcomes.iter().filter_map(|(kind, outcome)| match outcome {
            SinkOutcome::Failed(reason) => Some((*kind, reason.as_str())),
            _ => None,
        })
    }

    /// Outcome of the first sink of `kind`.
    pub fn outcome(&self, kind: SinkKind) -> Option<&SinkOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }
}

/// State guarded by the dispatcher's lock.
struct DispatchState {
    /// Active sinks in registration order
    sinks: RefCell<Vec<Arc<dyn Sink>>>,
    /// Last ring built or installed; outlives `disable` and `remove_sinks`
    memory: RefCell<Option<Arc<RingBufferSink>>>,
    /// Current failure-report nesting
    depth: Cell<u32>,
}

pub struct Dispatcher {
    state: ReentrantMutex<DispatchState>,
    notifier: Notifier,
    session: SessionId,
}

impl Dispatcher {
    pub fn new(session: SessionId) -> Self {
        Self {
            state: ReentrantMutex::new(DispatchState {
                sinks: RefCell::new(Vec::new()),
                memory: RefCell::new(None),
                depth: Cell::new(0),
            }),
            notifier: Notifier::new(),
            session,
        }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Callback slot shared by every ring this dispatcher builds.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════════

    /// Dispatch one event and report whether every active sink accepted it.
    ///
    /// Returns `false` when no sink is active.
    pub fn emit(
        &self,
        severity: Severity,
        message: Option<&str>,
        detail: bool,
        site: CallSite<'_>,
    ) -> bool {
        self.emit_report(severity, message, detail, site)
            .accepted_all()
    }

    /// Dispatch one event and return every sink's outcome.
    pub fn emit_report(
        &self,
        severity: Severity,
        message: Option<&str>,
        detail: bool,
        site: CallSite<'_>,
    ) -> DispatchReport {
        let state = self.state.lock();

        let event = Event::capture(severity, message, site);
        let line = render_line(&event, detail);
        let sinks = state.sinks.borrow().clone();

        let mut report = DispatchReport::default();
        for sink in &sinks {
            let payload = if sink.kind().takes_events() {
                Payload::Event(&event)
            } else {
                Payload::Line {
                    line: &line,
                    severity,
                }
            };

            let outcome = sink.write(payload);
            if let SinkOutcome::Failed(reason) = &outcome {
                warn!(sink = %sink.kind(), %reason, "Sink write failed");
                if sink.reports_failures() {
                    self.report_failure(&state, sink.kind(), reason);
                }
            }
            report.outcomes.push((sink.kind(), outcome));
        }

        report
    }

    /// Log a sink failure through the Error path, one level deep at most.
    fn report_failure(&self, state: &DispatchState, kind: SinkKind, reason: &str) {
        let depth = state.depth.get();
        if depth >= MAX_FAILURE_DEPTH {
            return;
        }

        state.depth.set(depth + 1);
        let message = format!("{} sink failed: {}", kind, reason);
        self.emit_report(
            Severity::Error,
            Some(&message),
            true,
            CallSite::new(FAILURE_CALLER, file!(), line!()),
        );
        state.depth.set(depth);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Sink set
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace the active set with the sinks selected by `mask`.
    ///
    /// Every sink is built before the swap. If any construction fails the
    /// previous set stays active and the error is returned.
    pub fn change_sinks(&self, mask: SinkMask, config: &SinkConfig) -> LogResult<()> {
        let state = self.state.lock();

        let level = config.level;
        let mut built: Vec<Arc<dyn Sink>> = Vec::new();
        let mut memory = None;

        for kind in mask.kinds() {
            debug!(sink = %kind, %level, "Building sink");
            match kind {
                SinkKind::Console => {
                    built.push(Arc::new(TerminalSink::new(level, config.color)));
                }
                SinkKind::Debug => {
                    built.push(Arc::new(DebugChannelSink::new(level)));
                }
                SinkKind::File => {
                    let sink = match &config.file_path {
                        Some(path) => FileSink::new(level, path),
                        None => FileSink::in_default_dir(level, &self.session)?,
                    };
                    built.push(Arc::new(sink));
                }
                SinkKind::Memory => {
                    let ring = Arc::new(RingBufferSink::with_notifier(
                        level,
                        config.ring_capacity,
                        self.notifier.clone(),
                    )?);
                    memory = Some(ring.clone());
                    built.push(ring);
                }
                SinkKind::Relational => {
                    built.push(Arc::new(RelationalSink::open(
                        level,
                        &config.store_path,
                        &self.session,
                    )?));
                }
            }
        }

        *state.sinks.borrow_mut() = built;
        if let Some(ring) = memory {
            *state.memory.borrow_mut() = Some(ring);
        }

        info!(sinks = %mask, %level, "Sink set changed");
        Ok(())
    }

    /// Drop every active sink whose kind is in `mask`.
    pub fn remove_sinks(&self, mask: SinkMask) {
        let state = self.state.lock();
        state
            .sinks
            .borrow_mut()
            .retain(|sink| !mask.contains(sink.kind()));
        debug!(sinks = %mask, "Sinks removed");
    }

    /// Drop every active sink. The last ring stays queryable.
    pub fn disable(&self) {
        let state = self.state.lock();
        state.sinks.borrow_mut().clear();
    }

    /// Append a pre-built sink to the active set.
    ///
    /// Memory sinks are rejected with `LogError::InvalidConfig`: queries and
    /// the change callback only see rings built by [`Dispatcher::install_ring`].
    pub fn install(&self, sink: Arc<dyn Sink>) -> LogResult<()> {
        if sink.kind() == SinkKind::Memory {
            return Err(LogError::InvalidConfig(
                "memory sinks must be added with install_ring".to_string(),
            ));
        }

        let state = self.state.lock();
        debug!(sink = %sink.kind(), threshold = %sink.threshold(), "Installing sink");
        state.sinks.borrow_mut().push(sink);
        Ok(())
    }

    /// Build a ring bound to this dispatcher's callback, append it and make
    /// it the one queries read from.
    pub fn install_ring(
        &self,
        threshold: Severity,
        capacity: usize,
    ) -> LogResult<Arc<RingBufferSink>> {
        let ring = Arc::new(RingBufferSink::with_notifier(
            threshold,
            capacity,
            self.notifier.clone(),
        )?);

        let state = self.state.lock();
        debug!(%threshold, capacity, "Installing ring");
        state.sinks.borrow_mut().push(ring.clone());
        *state.memory.borrow_mut() = Some(ring.clone());
        Ok(ring)
    }

    /// Kinds of the active sinks in fan-out order.
    pub fn active_kinds(&self) -> Vec<SinkKind> {
        let state = self.state.lock();
        let kinds: Vec<SinkKind> = state.sinks.borrow().iter().map(|sink| sink.kind()).collect();
        kinds
    }

    pub fn memory(&self) -> Option<Arc<RingBufferSink>> {
        let state = self.state.lock();
        let ring: Option<Arc<RingBufferSink>> = state.memory.borrow().clone();
        ring
    }

    /// Run `f` against the current ring while holding the dispatch lock.
    pub fn with_memory<R>(&self, f: impl FnOnce(&RingBufferSink) -> R) -> Option<R> {
        let _state = self.state.lock();
        self.memory().map(|ring| f(&ring))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("session", &self.session)
            .field("sinks", &self.active_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Records every line it accepts.
    struct Recording {
        kind: SinkKind,
        threshold: Severity,
        lines: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(kind: SinkKind, threshold: Severity) -> Arc<Self> {
            Arc::new(Self {
                kind,
                threshold,
                lines: Mutex::new(Vec::new()),
            })
        }
    }

    impl Sink for Recording {
        fn kind(&self) -> SinkKind {
            self.kind
        }

        fn threshold(&self) -> Severity {
            self.threshold
        }

        fn write(&self, payload: Payload<'_>) -> SinkOutcome {
            if !self.accepts(payload.severity()) {
                return SinkOutcome::Filtered;
            }
            self.lines.lock().push(payload.to_line());
            SinkOutcome::Accepted
        }
    }

    /// Fails every write.
    struct Broken {
        reports: bool,
        attempts: Mutex<u32>,
    }

    impl Sink for Broken {
        fn kind(&self) -> SinkKind {
            SinkKind::Relational
        }

        fn threshold(&self) -> Severity {
            Severity::Debug
        }

        fn write(&self, _payload: Payload<'_>) -> SinkOutcome {
            *self.attempts.lock() += 1;
            SinkOutcome::Failed("store offline".to_string())
        }

        fn reports_failures(&self) -> bool {
            self.reports
        }
    }

    fn site() -> CallSite<'static> {
        CallSite::new("main", "src/main.rs", 7)
    }

    #[test]
    fn test_no_sinks_is_false() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let report = dispatcher.emit_report(Severity::Info, Some("hi"), false, site());
        assert!(report.is_empty());
        assert!(!dispatcher.emit(Severity::Info, Some("hi"), false, site()));
    }

    #[test]
    fn test_line_format_reaches_text_sinks() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let sink = Recording::new(SinkKind::Console, Severity::Debug);
        dispatcher.install(sink.clone()).unwrap();

        assert!(dispatcher.emit(Severity::Error, Some("boom"), true, site()));

        let lines = sink.lines.lock();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("[ Error ] -> main.rs >> main() >> in line[  7]: boom"));
    }

    #[test]
    fn test_filtered_sink_makes_emit_false() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let loud = Recording::new(SinkKind::Console, Severity::Debug);
        let quiet = Recording::new(SinkKind::File, Severity::Error);
        dispatcher.install(loud.clone()).unwrap();
        dispatcher.install(quiet.clone()).unwrap();

        let report = dispatcher.emit_report(Severity::Info, Some("x"), false, site());
        assert!(!report.accepted_all());
        assert_eq!(report.outcome(SinkKind::Console), Some(&SinkOutcome::Accepted));
        assert_eq!(report.outcome(SinkKind::File), Some(&SinkOutcome::Filtered));
        assert_eq!(report.failures().count(), 0);

        // Both sinks were attempted.
        assert_eq!(loud.lines.lock().len(), 1);
    }

    #[test]
    fn test_failure_does_not_stop_fan_out() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let broken = Arc::new(Broken {
            reports: false,
            attempts: Mutex::new(0),
        });
        let after = Recording::new(SinkKind::Console, Severity::Debug);
        dispatcher.install(broken.clone()).unwrap();
        dispatcher.install(after.clone()).unwrap();

        let report = dispatcher.emit_report(Severity::Warn, Some("x"), false, site());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures, [(SinkKind::Relational, "store offline")]);
        assert_eq!(after.lines.lock().len(), 1);
        assert_eq!(*broken.attempts.lock(), 1);
    }

    #[test]
    fn test_reported_failure_recurses_once() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let broken = Arc::new(Broken {
            reports: true,
            attempts: Mutex::new(0),
        });
        let watcher = Recording::new(SinkKind::Console, Severity::Debug);
        dispatcher.install(broken.clone()).unwrap();
        dispatcher.install(watcher.clone()).unwrap();

        assert!(!dispatcher.emit(Severity::Info, Some("payload"), false, site()));

        // Top-level write plus one nested Error emit, which fails again silently.
        assert_eq!(*broken.attempts.lock(), 2);
        let lines = watcher.lines.lock();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[ Error ]"));
        assert!(lines[0].contains(&format!("{}()", FAILURE_CALLER)));
        assert!(lines[0].ends_with("relational sink failed: store offline"));
        assert!(lines[1].ends_with("payload"));
    }

    #[test]
    fn test_change_failure_keeps_previous_set() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let config = SinkConfig::default().with_ring_capacity(4);
        dispatcher
            .change_sinks(SinkMask::MEMORY | SinkMask::DEBUG, &config)
            .unwrap();
        assert_eq!(dispatcher.active_kinds(), [SinkKind::Debug, SinkKind::Memory]);

        let err = dispatcher
            .change_sinks(SinkMask::DEBUG | SinkMask::MEMORY, &config.with_ring_capacity(0))
            .unwrap_err();
        assert!(matches!(err, crate::error::LogError::InvalidConfig(_)));
        assert_eq!(dispatcher.active_kinds(), [SinkKind::Debug, SinkKind::Memory]);
        assert_eq!(dispatcher.memory().unwrap().capacity(), 4);
    }

    #[test]
    fn test_remove_and_disable() {
        let dispatcher = Dispatcher::new(SessionId::new());
        dispatcher
            .change_sinks(SinkMask::DEBUG | SinkMask::MEMORY, &SinkConfig::default())
            .unwrap();

        dispatcher.remove_sinks(SinkMask::DEBUG);
        assert_eq!(dispatcher.active_kinds(), [SinkKind::Memory]);

        assert!(dispatcher.emit(Severity::Info, Some("kept"), false, site()));
        dispatcher.disable();
        assert!(dispatcher.active_kinds().is_empty());

        let held = dispatcher.with_memory(|ring| ring.len());
        assert_eq!(held, Some(1));
    }

    #[test]
    fn test_callback_can_mutate_sink_set() {
        let dispatcher = Arc::new(Dispatcher::new(SessionId::new()));
        dispatcher
            .change_sinks(SinkMask::MEMORY, &SinkConfig::default())
            .unwrap();
        let after = Recording::new(SinkKind::Console, Severity::Debug);
        dispatcher.install(after.clone()).unwrap();

        let weak = Arc::downgrade(&dispatcher);
        dispatcher.notifier().set(Arc::new(move |_event: &Event| {
            if let Some(dispatcher) = weak.upgrade() {
                dispatcher.disable();
            }
        }));

        // The in-flight dispatch still reaches the console recorder.
        assert!(dispatcher.emit(Severity::Info, Some("last"), false, site()));
        assert_eq!(after.lines.lock().len(), 1);
        assert!(dispatcher.active_kinds().is_empty());
    }

    #[test]
    fn test_install_rejects_memory_sink() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let ring = Arc::new(RingBufferSink::new(Severity::Warn, 4).unwrap());

        let err = dispatcher.install(ring.clone()).unwrap_err();
        assert!(matches!(err, LogError::InvalidConfig(_)));
        assert!(dispatcher.active_kinds().is_empty());
        assert!(dispatcher.memory().is_none());

        // Nothing reaches the rejected ring.
        dispatcher.emit(Severity::Warn, Some("kept"), false, site());
        assert!(ring.is_empty());
    }

    #[test]
    fn test_install_ring_is_queryable_and_notifies() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let ring = dispatcher.install_ring(Severity::Warn, 4).unwrap();
        assert_eq!(dispatcher.active_kinds(), [SinkKind::Memory]);

        let seen = Arc::new(Mutex::new(0u32));
        let counter = seen.clone();
        dispatcher.notifier().set(Arc::new(move |_event: &Event| {
            *counter.lock() += 1;
        }));

        assert!(dispatcher.emit(Severity::Warn, Some("kept"), false, site()));
        assert!(!dispatcher.emit(Severity::Info, Some("dropped"), false, site()));

        assert_eq!(*seen.lock(), 1);
        assert_eq!(ring.len(), 1);
        assert_eq!(dispatcher.with_memory(|held| held.len()), Some(1));
        assert!(Arc::ptr_eq(&ring, &dispatcher.memory().unwrap()));
    }

    #[test]
    fn test_install_ring_rejects_zero_capacity() {
        let dispatcher = Dispatcher::new(SessionId::new());
        let err = dispatcher.install_ring(Severity::Debug, 0).unwrap_err();
        assert!(matches!(err, LogError::InvalidConfig(_)));
        assert!(dispatcher.active_kinds().is_empty());
    }
}
