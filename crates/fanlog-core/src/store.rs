//! Persistent session/log store using redb.
//!
//! Two tables model the relational layout:
//!
//! ```text
//! sessions  id (auto) → { session_id: ULID text, start_time_ms }
//! logs      id (auto) → { time_ms, severity, message, caller, file, line,
//!                         session: sessions.id }
//! ```
//!
//! Ids are assigned as `max(id) + 1` inside the write transaction, which
//! redb serializes, so they are unique and increasing per file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};
use crate::event::Event;
use crate::types::{SessionId, Severity};

/// Default store file, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "logs.redb";

const SESSIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("sessions");
const LOGS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("logs");

/// One row of the sessions table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: u64,
    pub session_id: String,
    /// Milliseconds since the Unix epoch
    pub start_time_ms: i64,
}

/// One row of the logs table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub id: u64,
    /// Milliseconds since the Unix epoch
    pub time_ms: i64,
    pub severity: String,
    pub message: Option<String>,
    pub caller: Option<String>,
    pub file: Option<String>,
    pub line: u32,
    /// Id of the owning [`SessionRow`]
    pub session: u64,
}

/// Optional filters for [`LogStore::query`]; time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
    pub severity: Option<Severity>,
}

impl LogQuery {
    fn matches(&self, row: &LogRow) -> bool {
        self.start_ms.map_or(true, |start| row.time_ms >= start)
            && self.end_ms.map_or(true, |end| row.time_ms <= end)
            && self
                .severity
                .map_or(true, |severity| row.severity == severity.as_str())
    }
}

/// Handle to an open store file
pub struct LogStore {
    db: Database,
    path: PathBuf,
}

impl LogStore {
    /// Open (creating if needed) the store at `path`.
    ///
    /// This will:
    /// - Create the parent directory if it doesn't exist
    /// - Create the database file
    /// - Create both tables
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSIONS_TABLE)?;
            let _ = write_txn.open_table(LOGS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Writes
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a session row and return its id.
    pub fn begin_session(&self, session: &SessionId, started: DateTime<Local>) -> LogResult<u64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(SESSIONS_TABLE)?;
            let id = next_id(&table)?;
            let row = SessionRow {
                id,
                session_id: session.to_string(),
                start_time_ms: started.timestamp_millis(),
            };
            table.insert(id, encode(&row)?.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Insert one event under the session row `session` and return its id.
    pub fn append(&self, session: u64, event: &Event) -> LogResult<u64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(LOGS_TABLE)?;
            let id = next_id(&table)?;
            let row = LogRow {
                id,
                time_ms: event.timestamp_millis(),
                severity: event.severity().as_str().to_string(),
                message: event.message().map(str::to_owned),
                caller: event.caller().map(str::to_owned),
                file: event.file().map(str::to_owned),
                line: event.line().unwrap_or(0),
                session,
            };
            table.insert(id, encode(&row)?.as_slice())?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════════════════

    /// All session rows in id order.
    pub fn sessions(&self) -> LogResult<Vec<SessionRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;

        let mut sessions = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            sessions.push(decode(value.value())?);
        }
        Ok(sessions)
    }

    /// Log rows written under any session row carrying `session_id`.
    pub fn logs_for_session(&self, session_id: &str) -> LogResult<Vec<LogRow>> {
        let owners: Vec<u64> = self
            .sessions()?
            .into_iter()
            .filter(|row| row.session_id.eq_ignore_ascii_case(session_id))
            .map(|row| row.id)
            .collect();

        if owners.is_empty() {
            return Ok(Vec::new());
        }
        self.scan_logs(|row| owners.contains(&row.session))
    }

    /// Log rows matching every filter set in `query`, in id order.
    pub fn query(&self, query: &LogQuery) -> LogResult<Vec<LogRow>> {
        self.scan_logs(|row| query.matches(row))
    }

    fn scan_logs(&self, keep: impl Fn(&LogRow) -> bool) -> LogResult<Vec<LogRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOGS_TABLE)?;

        let mut rows = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let row: LogRow = decode(value.value())?;
            if keep(&row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

fn next_id(table: &impl ReadableTable<u64, &'static [u8]>) -> LogResult<u64> {
    Ok(match table.last()? {
        Some((key, _)) => key.value() + 1,
        None => 1,
    })
}

fn encode<T: Serialize>(row: &T) -> LogResult<Vec<u8>> {
    postcard::to_allocvec(row).map_err(|e| LogError::Serialization(e.to_string()))
}

fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> LogResult<T> {
    postcard::from_bytes(bytes).map_err(|e| LogError::Serialization(e.to_string()))
}
