//! The log event value shared by every sink.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::types::{CallSite, Severity};

/// A single log occurrence.
///
/// Events are created by the dispatcher while it holds the global lock, so
/// the timestamp reflects the moment of the write rather than the moment the
/// caller decided to log. Fields are read-only once the event exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    timestamp: DateTime<Local>,
    severity: Severity,
    message: Option<String>,
    caller: Option<String>,
    file: Option<String>,
    line: Option<u32>,
}

impl Event {
    /// Create an event stamped with the current local time.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: Some(message.into()),
            caller: None,
            file: None,
            line: None,
        }
    }

    /// Create an event for a call site, stamped with the current local time.
    pub fn capture(severity: Severity, message: Option<&str>, site: CallSite<'_>) -> Self {
        Self {
            timestamp: Local::now(),
            severity,
            message: message.map(str::to_owned),
            caller: site.caller.map(str::to_owned),
            file: site.file.map(str::to_owned),
            line: site.line,
        }
    }

    /// Replace the timestamp (used when replaying or building fixtures).
    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach call-site provenance.
    pub fn with_site(mut self, site: CallSite<'_>) -> Self {
        self.caller = site.caller.map(str::to_owned);
        self.file = site.file.map(str::to_owned);
        self.line = site.line;
        self
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    /// Source file exactly as captured (usually crate-relative).
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Final path component of [`Event::file`].
    pub fn file_name(&self) -> Option<&str> {
        self.file.as_deref().map(base_name)
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Final component of a path-like string, accepting either separator.
pub(crate) fn base_name(path: &str) -> &str {
    let tail = path.rsplit(['/', '\\']).next().unwrap_or(path);
    if tail.is_empty() {
        Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path)
    } else {
        tail
    }
}
