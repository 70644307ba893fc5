//! Event kind enum covering the push-channel catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two event kinds delivered over the realtime channel.
///
/// String representation matches the wire channel names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A citizen submitted a new issue; payload is the full record.
    IssueCreated,
    /// An admin changed an issue's status; payload is the minimal delta.
    StatusChanged,
}

/// Error returned when parsing an unknown event kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventKind {
    /// The unrecognised input string.
    pub raw: String,
}

impl fmt::Display for UnknownEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown event kind '{}': expected one of new_issue, status_updated",
            self.raw
        )
    }
}

impl std::error::Error for UnknownEventKind {}

impl EventKind {
    /// All known event kinds in catalog order.
    pub const ALL: [Self; 2] = [Self::IssueCreated, Self::StatusChanged];

    /// Return the canonical wire channel name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IssueCreated => "new_issue",
            Self::StatusChanged => "status_updated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_issue" => Ok(Self::IssueCreated),
            "status_updated" => Ok(Self::StatusChanged),
            _ => Err(UnknownEventKind { raw: s.to_string() }),
        }
    }
}

// Custom serde: serialize as the wire channel name.
impl Serialize for EventKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
