//! Debug-channel passthrough into `tracing`.
//!
//! The formatted line is re-emitted as a `tracing` event under the target
//! [`CHANNEL_TARGET`], so whatever subscriber the host application installed
//! (console, JSON files, an IDE collector) receives it. Fatal maps to
//! `ERROR`, the highest level `tracing` has.

use super::{Payload, Sink, SinkOutcome};
use crate::types::{Severity, SinkKind};

/// `tracing` target used for forwarded lines.
pub const CHANNEL_TARGET: &str = "fanlog::channel";

pub struct DebugChannelSink {
    threshold: Severity,
}

impl DebugChannelSink {
    pub fn new(threshold: Severity) -> Self {
        Self { threshold }
    }
}

impl Sink for DebugChannelSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Debug
    }

    fn threshold(&self) -> Severity {
        self.threshold
    }

    fn write(&self, payload: Payload<'_>) -> SinkOutcome {
        let severity = payload.severity();
        if !self.accepts(severity) {
            return SinkOutcome::Filtered;
        }

        let line = payload.to_line();
        match severity {
            Severity::Debug => tracing::debug!(target: CHANNEL_TARGET, "{}", line),
            Severity::Info => tracing::info!(target: CHANNEL_TARGET, "{}", line),
            Severity::Warn => tracing::warn!(target: CHANNEL_TARGET, "{}", line),
            Severity::Error | Severity::Fatal => {
                tracing::error!(target: CHANNEL_TARGET, severity = %severity, "{}", line)
            }
        }
        SinkOutcome::Accepted
    }
}
