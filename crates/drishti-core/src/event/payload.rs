//! Typed payloads for each event kind, with strict wire parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::types::EventKind;
use crate::model::{Issue, PublicCode, Status};

/// Minimal payload carried by a `status_updated` event.
///
/// Deliberately lightweight: only the fields a cache is allowed to merge,
/// plus enough identity for routing and display. Fields absent here
/// (description, media, ...) must never be clobbered on merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Internal id of the updated issue.
    pub id: String,
    /// Display code, for notices.
    pub public_code: PublicCode,
    /// Owner of the issue, for citizen-view routing.
    pub reporter_id: String,
    /// The authoritative status after the update.
    pub status: Status,
    /// The authoritative resolution time after the update.
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A parsed realtime event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    /// `new_issue`: the full record of a just-created issue.
    IssueCreated(Box<Issue>),
    /// `status_updated`: the minimal status delta.
    StatusChanged(StatusChange),
}

impl RealtimeEvent {
    /// The kind tag for this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::IssueCreated(_) => EventKind::IssueCreated,
            Self::StatusChanged(_) => EventKind::StatusChanged,
        }
    }

    /// The id of the issue this event concerns.
    #[must_use]
    pub fn issue_id(&self) -> &str {
        match self {
            Self::IssueCreated(issue) => &issue.id,
            Self::StatusChanged(change) => &change.id,
        }
    }

    /// The display code of the issue this event concerns.
    #[must_use]
    pub const fn public_code(&self) -> &PublicCode {
        match self {
            Self::IssueCreated(issue) => &issue.public_code,
            Self::StatusChanged(change) => &change.public_code,
        }
    }

    /// The reporter that owns the issue this event concerns.
    #[must_use]
    pub fn reporter_id(&self) -> &str {
        match self {
            Self::IssueCreated(issue) => &issue.reporter.id,
            Self::StatusChanged(change) => &change.reporter_id,
        }
    }

    /// Parse a wire message into a typed event.
    ///
    /// The kind discriminant travels as the channel name, separate from
    /// the JSON payload, so parsing is two-step: resolve the kind, then
    /// deserialize the payload against that kind's schema. Messages with
    /// an unknown kind, malformed JSON, or a blank issue id are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`EventParseError`] describing the rejection.
    pub fn parse(kind: &str, payload: &str) -> Result<Self, EventParseError> {
        let kind = EventKind::from_str(kind)
            .map_err(|e| EventParseError::UnknownKind { raw: e.raw })?;

        let event = match kind {
            EventKind::IssueCreated => serde_json::from_str::<Issue>(payload)
                .map(|issue| Self::IssueCreated(Box::new(issue))),
            EventKind::StatusChanged => {
                serde_json::from_str::<StatusChange>(payload).map(Self::StatusChanged)
            }
        }
        .map_err(|source| EventParseError::Payload { kind, source })?;

        if event.issue_id().trim().is_empty() {
            return Err(EventParseError::MissingField { kind, field: "id" });
        }
        Ok(event)
    }

    /// Serialize the payload for the wire.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload fails to serialize (should not
    /// happen with well-formed records).
    pub fn payload_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::IssueCreated(issue) => serde_json::to_string(issue),
            Self::StatusChanged(change) => serde_json::to_string(change),
        }
    }
}

/// Error returned when an inbound wire message is rejected.
#[derive(Debug)]
pub enum EventParseError {
    /// The channel name did not match any catalogued kind.
    UnknownKind {
        /// The unrecognised channel name.
        raw: String,
    },
    /// The JSON payload did not match the kind's schema.
    Payload {
        /// The kind whose schema was applied.
        kind: EventKind,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
    /// The payload parsed but a required field was blank.
    MissingField {
        kind: EventKind,
        field: &'static str,
    },
}

impl fmt::Display for EventParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind { raw } => write!(f, "unknown event kind '{raw}'"),
            Self::Payload { kind, source } => {
                write!(f, "invalid {kind} payload: {source}")
            }
            Self::MissingField { kind, field } => {
                write!(f, "invalid {kind} payload: '{field}' must not be blank")
            }
        }
    }
}

impl std::error::Error for EventParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload { source, .. } => Some(source),
            Self::UnknownKind { .. } | Self::MissingField { .. } => None,
        }
    }
}
