//! Error types for fanlog

use thiserror::Error;

/// Main error type for fanlog operations
///
/// Only configuration and store-management paths return this type. Per-write
/// sink failures never escape a sink; they are folded into
/// [`SinkOutcome::Failed`](crate::sink::SinkOutcome::Failed) instead.
#[derive(Error, Debug)]
pub enum LogError {
    /// A sink or engine was configured with values it cannot honour
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A severity name could not be parsed
    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    /// A sink selection name could not be parsed
    #[error("Unknown sink kind: {0}")]
    UnknownSink(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LogError::InvalidConfig("ring capacity must be greater than zero".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid configuration: ring capacity must be greater than zero"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: LogError = io_err.into();
        assert!(matches!(err, LogError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }
}
