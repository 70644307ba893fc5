//! The issue record and its status enumeration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::media::MediaRef;
use super::public_code::PublicCode;
use crate::error::Error;

/// The four lifecycle states of a reported issue.
///
/// `Resolved` and `Rejected` are terminal in practice (they disable
/// citizen edit/delete) but not terminal in the model: the transition
/// policy decides which admin moves are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Pending,
    Resolved,
    Rejected,
}

impl Status {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Open, Self::Pending, Self::Resolved, Self::Rejected];

    /// Canonical lowercase wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a status value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    /// The rejected input.
    pub raw: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status '{}': expected one of open, pending, resolved, rejected",
            self.raw
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError { raw: s.to_string() }),
        }
    }
}

/// Reporter profile captured at submission time.
///
/// This is a snapshot, not a live link: later profile edits do not
/// retroactively change submitted issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterSnapshot {
    /// Stable id of the submitting account.
    pub id: String,
    /// Full name at submission time.
    pub name: String,
    /// Contact line (phone and/or address).
    pub contact: String,
    /// Self-declared reporter category (resident, shopkeeper, ...).
    pub category: String,
    /// Free-text detail when `category` is "other".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_detail: Option<String>,
}

/// A citizen-reported civic problem tracked through the status lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Opaque server-assigned identifier. Never reused.
    pub id: String,
    /// Human-readable display code. Never reused.
    pub public_code: PublicCode,
    pub title: String,
    pub description: String,
    /// Free-text location of the problem.
    pub location: String,
    /// Calendar date the problem was observed.
    pub occurred_on: NaiveDate,
    pub status: Status,
    pub reporter: ReporterSnapshot,
    /// Ordered attachment references; editable only while `Open`.
    #[serde(default)]
    pub media: Vec<MediaRef>,
    pub created_at: DateTime<Utc>,
    /// Set exactly while `status == Resolved`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Returns `true` while the owner may still edit or delete the issue.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self.status, Status::Open)
    }

    /// Check internal consistency of the record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a required field is blank or the
    /// `resolved_at`/`status` invariant is broken.
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(Error::validation("description is required"));
        }
        if self.location.trim().is_empty() {
            return Err(Error::validation("location is required"));
        }
        if self.status == Status::Resolved && self.resolved_at.is_none() {
            return Err(Error::validation("resolved issues must carry a resolution time"));
        }
        if self.status != Status::Resolved && self.resolved_at.is_some() {
            return Err(Error::validation(
                "only resolved issues may carry a resolution time",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Issue, ParseStatusError, ReporterSnapshot, Status};
    use crate::model::media::MediaRef;
    use crate::model::public_code::PublicCode;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;

    pub(crate) fn sample_issue() -> Issue {
        let code = PublicCode::new(
            NaiveDate::from_ymd_opt(2026, 8, 7).expect("valid date"),
            1,
        );
        Issue {
            id: code.derive_issue_id(),
            public_code: code,
            title: "Road potholes".to_string(),
            description: "Deep potholes near the market crossing".to_string(),
            location: "MG Road, ward 12".to_string(),
            occurred_on: NaiveDate::from_ymd_opt(2026, 8, 5).expect("valid date"),
            status: Status::Open,
            reporter: ReporterSnapshot {
                id: "usr-17".to_string(),
                name: "Asha Rao".to_string(),
                contact: "98450 00000, Indiranagar".to_string(),
                category: "resident".to_string(),
                category_detail: None,
            },
            media: vec![MediaRef::new("/uploads/pothole.jpg")],
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[test]
    fn status_wire_form_is_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Open).expect("serialize"), "\"open\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"rejected\"").expect("deserialize"),
            Status::Rejected
        );
    }

    #[test]
    fn status_display_parse_roundtrips() {
        for status in Status::ALL {
            let rendered = status.to_string();
            assert_eq!(Status::from_str(&rendered).expect("reparse"), status);
        }
    }

    #[test]
    fn status_parse_normalizes_case_and_whitespace() {
        assert_eq!(Status::from_str(" Resolved ").expect("parse"), Status::Resolved);
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        let err = Status::from_str("closed").unwrap_err();
        assert_eq!(err, ParseStatusError { raw: "closed".to_string() });
        assert!(err.to_string().contains("closed"));
    }

    #[test]
    fn only_open_issues_are_editable() {
        let mut issue = sample_issue();
        assert!(issue.is_editable());
        for status in [Status::Pending, Status::Resolved, Status::Rejected] {
            issue.status = status;
            assert!(!issue.is_editable(), "status {status}");
        }
    }

    #[test]
    fn validate_enforces_required_fields() {
        let mut issue = sample_issue();
        issue.title = "   ".to_string();
        assert!(issue.validate().is_err());

        let mut issue = sample_issue();
        issue.location = String::new();
        assert!(issue.validate().is_err());
    }

    #[test]
    fn validate_enforces_resolved_at_biconditional() {
        let mut issue = sample_issue();
        issue.status = Status::Resolved;
        assert!(issue.validate().is_err(), "resolved without timestamp");

        issue.resolved_at = Some(Utc::now());
        assert!(issue.validate().is_ok(), "resolved with timestamp");

        issue.status = Status::Pending;
        assert!(issue.validate().is_err(), "pending with stale timestamp");
    }

    #[test]
    fn issue_json_roundtrips() {
        let issue = sample_issue();
        let json = serde_json::to_string(&issue).expect("serialize");
        let back: Issue = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, issue);
    }
}
