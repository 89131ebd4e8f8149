//! Append-only text file sink.
//!
//! Each accepted line is appended with the file opened for that single write
//! and closed again afterwards, so other processes can rotate or tail the file
//! between writes. When no path is given, logs land in
//! `<cwd>/log/<yyyy-MM-dd HH-mm-ss> <session>.log`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use super::{Payload, Sink, SinkOutcome};
use crate::error::LogResult;
use crate::types::{SessionId, Severity, SinkKind};

/// Directory (under the working directory) used when no path is configured.
pub const DEFAULT_LOG_DIR: &str = "log";

pub struct FileSink {
    threshold: Severity,
    /// Target file, fixed for the sink's lifetime
    path: PathBuf,
    /// Serializes appends from this sink
    lock: Mutex<()>,
}

impl FileSink {
    /// Sink appending to `path`. The file is created on first write.
    pub fn new(threshold: Severity, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        debug!(?path, %threshold, "Creating file sink");
        Self {
            threshold,
            path,
            lock: Mutex::new(()),
        }
    }

    /// Sink appending to a session-named file under `<cwd>/log/`.
    ///
    /// # Errors
    ///
    /// Returns `LogError::Io` if the working directory cannot be resolved or
    /// the log directory cannot be created.
    pub fn in_default_dir(threshold: Severity, session: &SessionId) -> LogResult<Self> {
        let root = std::env::current_dir()?;
        Self::in_dir(threshold, root.join(DEFAULT_LOG_DIR), session)
    }

    /// Sink appending to a session-named file under `dir`, creating `dir`.
    pub fn in_dir(threshold: Severity, dir: impl AsRef<Path>, session: &SessionId) -> LogResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self::new(threshold, dir.join(default_file_name(session))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }
}

/// `yyyy-MM-dd HH-mm-ss <session>.log` for the current local time.
pub fn default_file_name(session: &SessionId) -> String {
    format!(
        "{} {}.log",
        chrono::Local::now().format("%Y-%m-%d %H-%M-%S"),
        session
    )
}

impl Sink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    fn threshold(&self) -> Severity {
        self.threshold
    }

    fn write(&self, payload: Payload<'_>) -> SinkOutcome {
        if !self.accepts(payload.severity()) {
            return SinkOutcome::Filtered;
        }

        match self.append(&payload.to_line()) {
            Ok(()) => SinkOutcome::Accepted,
            Err(e) => SinkOutcome::Failed(format!("{}: {}", self.path.display(), e)),
        }
    }
}
