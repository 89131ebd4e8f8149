//! Core types for fanlog

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::panic::Location;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::LogError;

/// Severity of a log event
///
/// The discriminants define a total order used for threshold filtering:
/// a sink with threshold `T` accepts every event with `severity >= T`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Display name, as written into formatted lines and the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "Debug",
            Severity::Info => "Info",
            Severity::Warn => "Warn",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal",
        }
    }

    /// Whether emitters at this severity include call-site detail by default
    pub fn default_detail(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LogError::UnknownSeverity(s.to_string()))
    }
}

/// Identifier of one engine lifetime
///
/// Uses ULID so that sessions sort by creation time in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Ulid);

impl SessionId {
    /// Create a new SessionId with current timestamp
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Get the underlying ULID
    pub fn as_ulid(&self) -> &Ulid {
        &self.0
    }

    /// Parse from string representation
    pub fn from_string(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind tag carried by every sink
///
/// The discriminants are the bit values used by [`SinkMask`]. They are
/// spaced sparsely so new kinds can be slotted in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Debug = 0x00001,
    Console = 0x00010,
    File = 0x00100,
    Memory = 0x01000,
    Relational = 0x10000,
}

impl SinkKind {
    /// All kinds in the order sinks are constructed and fanned out to
    pub const ORDERED: [SinkKind; 5] = [
        SinkKind::Console,
        SinkKind::Debug,
        SinkKind::File,
        SinkKind::Memory,
        SinkKind::Relational,
    ];

    pub fn bit(&self) -> u32 {
        *self as u32
    }

    pub fn name(&self) -> &'static str {
        match self {
            SinkKind::Debug => "debug",
            SinkKind::Console => "console",
            SinkKind::File => "file",
            SinkKind::Memory => "memory",
            SinkKind::Relational => "relational",
        }
    }

    /// Whether the dispatcher hands this kind the structured event rather
    /// than the pre-formatted line
    pub fn takes_events(&self) -> bool {
        matches!(self, SinkKind::Memory | SinkKind::Relational)
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SinkKind {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(SinkKind::Debug),
            "console" | "terminal" => Ok(SinkKind::Console),
            "file" => Ok(SinkKind::File),
            "memory" | "ring" => Ok(SinkKind::Memory),
            "relational" | "store" | "db" => Ok(SinkKind::Relational),
            _ => Err(LogError::UnknownSink(s.to_string())),
        }
    }
}

/// Combinable selection of sink kinds
///
/// ```
/// use fanlog_core::{SinkKind, SinkMask};
///
/// let mask = SinkMask::CONSOLE | SinkMask::MEMORY;
/// assert!(mask.contains(SinkKind::Memory));
/// assert!(!mask.contains(SinkKind::File));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SinkMask(u32);

impl SinkMask {
    pub const NONE: SinkMask = SinkMask(0);
    pub const DEBUG: SinkMask = SinkMask(SinkKind::Debug as u32);
    pub const CONSOLE: SinkMask = SinkMask(SinkKind::Console as u32);
    pub const FILE: SinkMask = SinkMask(SinkKind::File as u32);
    pub const MEMORY: SinkMask = SinkMask(SinkKind::Memory as u32);
    pub const RELATIONAL: SinkMask = SinkMask(SinkKind::Relational as u32);
    pub const ALL: SinkMask = SinkMask(
        SinkKind::Debug as u32
            | SinkKind::Console as u32
            | SinkKind::File as u32
            | SinkKind::Memory as u32
            | SinkKind::Relational as u32,
    );

    /// Build a mask from raw bits; bits that name no sink kind are dropped
    pub fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, kind: SinkKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Selected kinds in construction order
    pub fn kinds(&self) -> impl Iterator<Item = SinkKind> + '_ {
        SinkKind::ORDERED
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl From<SinkKind> for SinkMask {
    fn from(kind: SinkKind) -> Self {
        Self(kind.bit())
    }
}

impl BitOr for SinkMask {
    type Output = SinkMask;

    fn bitor(self, rhs: SinkMask) -> SinkMask {
        SinkMask(self.0 | rhs.0)
    }
}

impl BitOr<SinkKind> for SinkMask {
    type Output = SinkMask;

    fn bitor(self, rhs: SinkKind) -> SinkMask {
        SinkMask(self.0 | rhs.bit())
    }
}

impl BitOrAssign for SinkMask {
    fn bitor_assign(&mut self, rhs: SinkMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for SinkMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.kinds().map(|kind| kind.name()).collect();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(","))
        }
    }
}

/// Parses `"console,memory"`, `"all"` or `"none"`
impl FromStr for SinkMask {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => return Ok(SinkMask::ALL),
            "none" | "" => return Ok(SinkMask::NONE),
            _ => {}
        }

        let mut mask = SinkMask::NONE;
        for part in s.split(',').filter(|p| !p.trim().is_empty()) {
            mask |= SinkMask::from(part.parse::<SinkKind>()?);
        }
        Ok(mask)
    }
}

/// Provenance of a log call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSite<'a> {
    /// Name of the calling function, when known
    pub caller: Option<&'a str>,
    /// Source file of the call
    pub file: Option<&'a str>,
    /// Source line of the call
    pub line: Option<u32>,
}

impl CallSite<'static> {
    /// File and line of the nearest caller not marked `#[track_caller]`
    #[track_caller]
    pub fn here() -> Self {
        let location = Location::caller();
        Self {
            caller: None,
            file: Some(location.file()),
            line: Some(location.line()),
        }
    }
}

impl<'a> CallSite<'a> {
    pub fn new(caller: &'a str, file: &'a str, line: u32) -> Self {
        Self {
            caller: Some(caller),
            file: Some(file),
            line: Some(line),
        }
    }

    pub fn with_caller(mut self, caller: &'a str) -> Self {
        self.caller = Some(caller);
        self
    }
}
