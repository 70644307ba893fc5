//! The fetch/filter contract at the Issue Store boundary.
//!
//! [`IssueStore`] is the interface the clients consume from the
//! authoritative backend. Two implementations ship here: [`MemoryStore`]
//! for tests and session fixtures, and [`SqliteStore`] backing the CLI.
//! Both share the capability checks and draft validation in this module,
//! so the contract cannot drift between them.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use crate::error::{Error, Result};
use crate::model::{Issue, MediaRef, PublicCode, ReporterSnapshot, Status};

/// The capability attached to a request.
///
/// Token mechanics live outside the core; by the time a call reaches a
/// store the credential has been resolved into one of these. `Anonymous`
/// fails every protected call with an authentication error, which is the
/// signal sessions use to tear down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Citizen { id: String },
    Admin { name: String },
}

impl Caller {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    /// The citizen account id, when the caller is a citizen.
    #[must_use]
    pub fn citizen_id(&self) -> Option<&str> {
        match self {
            Self::Citizen { id } => Some(id),
            Self::Anonymous | Self::Admin { .. } => None,
        }
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Citizen { id } => write!(f, "citizen:{id}"),
            Self::Admin { name } => write!(f, "admin:{name}"),
        }
    }
}

/// Fail with [`Error::Authentication`] unless a credential is present.
pub(crate) fn require_authenticated(caller: &Caller) -> Result<()> {
    if matches!(caller, Caller::Anonymous) {
        return Err(Error::authentication("missing or rejected credential"));
    }
    Ok(())
}

/// Fail unless the caller carries the admin capability.
pub(crate) fn require_admin(caller: &Caller) -> Result<()> {
    require_authenticated(caller)?;
    if !caller.is_admin() {
        return Err(Error::authorization("admin capability required"));
    }
    Ok(())
}

/// Fail unless the caller owns `issue`.
pub(crate) fn require_owner(caller: &Caller, issue: &Issue) -> Result<()> {
    require_authenticated(caller)?;
    if caller.citizen_id() != Some(issue.reporter.id.as_str()) {
        return Err(Error::authorization("only the reporting citizen may modify this issue"));
    }
    Ok(())
}

/// Fail unless the issue is still owner-editable (status `Open`).
pub(crate) fn ensure_editable(issue: &Issue) -> Result<()> {
    if issue.is_editable() {
        Ok(())
    } else {
        Err(Error::authorization(format!(
            "issue {} is {} and can no longer be edited or deleted",
            issue.public_code, issue.status
        )))
    }
}

/// Listing criteria: optional status equality plus an optional
/// case-insensitive substring search over public code, title, and
/// description. Both combine with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub status: Option<Status>,
    pub search: Option<String>,
}

impl IssueFilter {
    /// Filter on status equality only.
    #[must_use]
    pub const fn by_status(status: Status) -> Self {
        Self { status: Some(status), search: None }
    }

    /// Filter on the substring search only.
    #[must_use]
    pub fn by_search(search: impl Into<String>) -> Self {
        Self { status: None, search: Some(search.into()) }
    }

    /// Returns `true` when no criteria are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.search.as_deref().is_none_or(str::is_empty)
    }

    /// In-memory predicate mirroring the SQL the projection runs.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(status) = self.status {
            if issue.status != status {
                return false;
            }
        }
        match self.search.as_deref() {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                issue.public_code.as_str().to_lowercase().contains(&needle)
                    || issue.title.to_lowercase().contains(&needle)
                    || issue.description.to_lowercase().contains(&needle)
            }
        }
    }
}

/// Citizen-supplied fields for a new issue, validated before submission.
#[derive(Debug, Clone)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub occurred_on: Option<NaiveDate>,
    pub media: Vec<MediaRef>,
    pub reporter: ReporterSnapshot,
}

impl IssueDraft {
    /// Client-side validation of required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(Error::validation("description is required"));
        }
        if self.location.trim().is_empty() {
            return Err(Error::validation("location is required"));
        }
        if self.occurred_on.is_none() {
            return Err(Error::validation("date of occurrence is required"));
        }
        if let Some(media) = self.media.iter().find(|m| !m.kind().is_submittable()) {
            return Err(Error::validation(format!(
                "attachment '{}' is neither an image nor a video",
                media.file_name()
            )));
        }
        Ok(())
    }
}

/// Media changes carried by an edit: the stored paths to keep plus the
/// newly attached references.
#[derive(Debug, Clone, Default)]
pub struct MediaDelta {
    pub retained: Vec<String>,
    pub added: Vec<MediaRef>,
}

/// Owner-supplied changes to an `Open` issue. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct IssueEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub occurred_on: Option<NaiveDate>,
    pub media: Option<MediaDelta>,
}

impl IssueEdit {
    /// Validate the populated fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a populated field is blank or a
    /// new attachment has an unsupported kind.
    pub fn validate(&self) -> Result<()> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(Error::validation("title must not be blank"));
        }
        if self.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(Error::validation("description must not be blank"));
        }
        if self.location.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(Error::validation("location must not be blank"));
        }
        if let Some(delta) = &self.media {
            if let Some(media) = delta.added.iter().find(|m| !m.kind().is_submittable()) {
                return Err(Error::validation(format!(
                    "attachment '{}' is neither an image nor a video",
                    media.file_name()
                )));
            }
        }
        Ok(())
    }

    /// Apply the edit to an issue record. Callers have already performed
    /// the ownership and editability checks.
    pub(crate) fn apply_to(&self, issue: &mut Issue) {
        if let Some(title) = &self.title {
            issue.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            issue.description.clone_from(description);
        }
        if let Some(location) = &self.location {
            issue.location.clone_from(location);
        }
        if let Some(occurred_on) = self.occurred_on {
            issue.occurred_on = occurred_on;
        }
        if let Some(delta) = &self.media {
            let mut media: Vec<MediaRef> = issue
                .media
                .iter()
                .filter(|m| delta.retained.iter().any(|p| p == m.path()))
                .cloned()
                .collect();
            media.extend(delta.added.iter().cloned());
            issue.media = media;
        }
    }
}

/// Wall-clock time truncated to microseconds, the precision the stores
/// persist. Keeps returned records identical to their reloaded form.
pub(crate) fn now_us() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// Assemble the authoritative record for a validated draft.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the draft is missing its occurrence
/// date (callers validate first; this is the backstop).
pub(crate) fn build_issue(
    draft: IssueDraft,
    sequence: u32,
    now: DateTime<Utc>,
) -> Result<Issue> {
    let occurred_on = draft
        .occurred_on
        .ok_or_else(|| Error::validation("date of occurrence is required"))?;
    let public_code = PublicCode::new(now.date_naive(), sequence);

    Ok(Issue {
        id: public_code.derive_issue_id(),
        public_code,
        title: draft.title,
        description: draft.description,
        location: draft.location,
        occurred_on,
        status: Status::Open,
        reporter: draft.reporter,
        media: draft.media,
        created_at: now,
        resolved_at: None,
    })
}

/// Operations the clients consume from the authoritative Issue Store.
///
/// Ordering contract: listings return issues newest first. No server-side
/// pagination; the admin client pages over the full result set.
pub trait IssueStore {
    /// List issues matching `filter`. Admin capability required.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] / [`Error::Authorization`] on capability
    /// failures; [`Error::Store`] on backend failures.
    fn list(&self, filter: &IssueFilter, caller: &Caller) -> Result<Vec<Issue>>;

    /// List one citizen's issues. Citizens may only list their own.
    ///
    /// # Errors
    ///
    /// Capability failures as for [`IssueStore::list`].
    fn list_for_reporter(&self, reporter_id: &str, caller: &Caller) -> Result<Vec<Issue>>;

    /// Fetch one issue by internal id.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if absent.
    fn get(&self, id: &str, caller: &Caller) -> Result<Issue>;

    /// Exact lookup by public display code.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if absent.
    fn find_by_public_code(&self, code: &str, caller: &Caller) -> Result<Issue>;

    /// Create an issue from a validated draft. Citizen capability
    /// required; the draft's reporter snapshot must match the caller.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] on missing required fields.
    fn create(&mut self, draft: IssueDraft, caller: &Caller) -> Result<Issue>;

    /// Edit an issue. Owner only, while status is `Open`.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] when the issue is no longer editable or
    /// the caller is not the owner, regardless of identity.
    fn update(&mut self, id: &str, edit: &IssueEdit, caller: &Caller) -> Result<Issue>;

    /// Delete an issue. Same precondition as [`IssueStore::update`].
    ///
    /// # Errors
    ///
    /// As for [`IssueStore::update`].
    fn delete(&mut self, id: &str, caller: &Caller) -> Result<()>;

    /// Change an issue's status. Admin capability required; the active
    /// transition policy decides which moves are legal.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], [`Error::Authorization`], or
    /// [`Error::Validation`] per the status-update contract.
    fn update_status(&mut self, id: &str, to: Status, caller: &Caller) -> Result<Issue>;
}
