//! Colored terminal output.

use std::io::Write;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::{Payload, Sink, SinkOutcome};
use crate::types::{Severity, SinkKind};

/// When the terminal sink emits color escapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout looks like a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl From<ColorMode> for ColorChoice {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Color scheme per severity.
pub fn color_spec(severity: Severity) -> ColorSpec {
    let mut spec = ColorSpec::new();
    match severity {
        Severity::Debug => {
            spec.set_fg(Some(Color::Black)).set_intense(true);
        }
        Severity::Info => {
            spec.set_fg(Some(Color::Cyan));
        }
        Severity::Warn => {
            spec.set_fg(Some(Color::Yellow));
        }
        Severity::Error => {
            spec.set_fg(Some(Color::Red)).set_intense(true);
        }
        Severity::Fatal => {
            spec.set_fg(Some(Color::Red)).set_bg(Some(Color::Ansi256(8)));
        }
    }
    spec
}

/// Writes each line to the terminal in its severity color.
pub struct TerminalSink {
    threshold: Severity,
    /// Output stream (locked so colored lines never interleave)
    out: Mutex<Box<dyn WriteColor + Send>>,
}

impl TerminalSink {
    /// Sink writing to stdout.
    pub fn new(threshold: Severity, color: ColorMode) -> Self {
        Self::with_writer(threshold, StandardStream::stdout(color.into()))
    }

    /// Sink writing to stderr.
    pub fn stderr(threshold: Severity, color: ColorMode) -> Self {
        Self::with_writer(threshold, StandardStream::stderr(color.into()))
    }

    /// Sink writing to any color-capable writer.
    pub fn with_writer(threshold: Severity, writer: impl WriteColor + Send + 'static) -> Self {
        Self {
            threshold,
            out: Mutex::new(Box::new(writer)),
        }
    }

    fn print(&self, line: &str, severity: Severity) -> std::io::Result<()> {
        let mut out = self.out.lock();
        out.set_color(&color_spec(severity))?;
        let written = write!(out, "{}", line);
        // Reset even if the text failed so the terminal is not left colored.
        out.reset()?;
        written?;
        writeln!(out)?;
        out.flush()
    }
}

impl Sink for TerminalSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Console
    }

    fn threshold(&self) -> Severity {
        self.threshold
    }

    fn write(&self, payload: Payload<'_>) -> SinkOutcome {
        let severity = payload.severity();
        if !self.accepts(severity) {
            return SinkOutcome::Filtered;
        }

        match self.print(&payload.to_line(), severity) {
            Ok(()) => SinkOutcome::Accepted,
            Err(e) => SinkOutcome::Failed(e.to_string()),
        }
    }
}
