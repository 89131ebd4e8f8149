//! Structured persistence into a [`LogStore`].
//!
//! A session row is inserted when the sink is built. Every accepted event
//! then becomes one log row pointing at it. The store file is opened for
//! each write and closed again when the write returns.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use super::{Payload, Sink, SinkOutcome};
use crate::error::LogResult;
use crate::event::Event;
use crate::store::LogStore;
use crate::types::{SessionId, Severity, SinkKind};

pub struct RelationalSink {
    threshold: Severity,
    path: PathBuf,
    /// Id of the session row created at construction
    session_row: u64,
}

impl RelationalSink {
    /// Open the store at `path` and register a new session row for `session`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the file cannot be created or written.
    pub fn open(threshold: Severity, path: impl AsRef<Path>, session: &SessionId) -> LogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let session_row = LogStore::open(&path)?.begin_session(session, Local::now())?;

        debug!(?path, session_row, %threshold, "Creating relational sink");

        Ok(Self {
            threshold,
            path,
            session_row,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_row(&self) -> u64 {
        self.session_row
    }

    fn persist(&self, event: &Event) -> LogResult<u64> {
        LogStore::open(&self.path)?.append(self.session_row, event)
    }
}

impl Sink for RelationalSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Relational
    }

    fn threshold(&self) -> Severity {
        self.threshold
    }

    fn write(&self, payload: Payload<'_>) -> SinkOutcome {
        let event = match payload {
            Payload::Event(event) => event,
            Payload::Line { .. } => {
                return SinkOutcome::Failed("relational sink only stores structured events".to_string())
            }
        };

        if !self.accepts(event.severity()) {
            return SinkOutcome::Filtered;
        }

        match self.persist(event) {
            Ok(_) => SinkOutcome::Accepted,
            Err(e) => SinkOutcome::Failed(e.to_string()),
        }
    }

    fn reports_failures(&self) -> bool {
        true
    }
}
