//! Sink construction settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LogError, LogResult};
use crate::sink::ColorMode;
use crate::store::DEFAULT_STORE_PATH;
use crate::types::Severity;

/// Default ring buffer capacity
pub const DEFAULT_RING_CAPACITY: usize = 100;

/// Settings shared by every sink built in one `enable`/`change` call.
///
/// ```
/// use fanlog_core::{Severity, SinkConfig};
///
/// let config = SinkConfig::default()
///     .with_level(Severity::Warn)
///     .with_ring_capacity(16);
/// assert_eq!(config.ring_capacity, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Minimum severity for every built sink
    pub level: Severity,
    /// Target for the file sink; `None` means `<cwd>/log/<timestamp> <session>.log`
    pub file_path: Option<PathBuf>,
    /// Store file for the relational sink
    pub store_path: PathBuf,
    pub ring_capacity: usize,
    pub color: ColorMode,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            level: Severity::Debug,
            file_path: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            ring_capacity: DEFAULT_RING_CAPACITY,
            color: ColorMode::Auto,
        }
    }
}

impl SinkConfig {
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_ring_capacity(mut self, capacity: usize) -> Self {
        self.ring_capacity = capacity;
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> LogResult<Self> {
        serde_json::from_str(json).map_err(|e| LogError::Serialization(e.to_string()))
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> LogResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
