//! In-memory reference store.
//!
//! Backs tests and fixtures with the exact same contract checks as the
//! SQLite store. Issues are held newest first; per-day public-code
//! sequences are high-water marked so codes are never reused, even after
//! deletes.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::{
    Caller, IssueDraft, IssueEdit, IssueFilter, IssueStore, build_issue, ensure_editable,
    now_us, require_admin, require_authenticated, require_owner,
};
use crate::error::{Error, Result};
use crate::lifecycle::{self, TransitionPolicy};
use crate::model::{Issue, Status};

/// Volatile [`IssueStore`] implementation.
pub struct MemoryStore {
    issues: Vec<Issue>,
    next_sequence: HashMap<NaiveDate, u32>,
    policy: Box<dyn TransitionPolicy + Send + Sync>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with the permissive transition policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(lifecycle::configured(false))
    }

    /// Create an empty store with an explicit transition policy.
    #[must_use]
    pub fn with_policy(policy: Box<dyn TransitionPolicy + Send + Sync>) -> Self {
        Self {
            issues: Vec::new(),
            next_sequence: HashMap::new(),
            policy,
        }
    }

    fn next_sequence_for(&mut self, day: NaiveDate) -> u32 {
        let counter = self.next_sequence.entry(day).or_insert(1);
        let sequence = *counter;
        *counter += 1;
        sequence
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.issues
            .iter()
            .position(|issue| issue.id == id)
            .ok_or_else(|| Error::not_found(id))
    }
}

impl IssueStore for MemoryStore {
    fn list(&self, filter: &IssueFilter, caller: &Caller) -> Result<Vec<Issue>> {
        require_admin(caller)?;
        Ok(self
            .issues
            .iter()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect())
    }

    fn list_for_reporter(&self, reporter_id: &str, caller: &Caller) -> Result<Vec<Issue>> {
        require_authenticated(caller)?;
        if let Some(id) = caller.citizen_id() {
            if id != reporter_id {
                return Err(Error::authorization("citizens may only list their own issues"));
            }
        }
        Ok(self
            .issues
            .iter()
            .filter(|issue| issue.reporter.id == reporter_id)
            .cloned()
            .collect())
    }

    fn get(&self, id: &str, caller: &Caller) -> Result<Issue> {
        require_authenticated(caller)?;
        Ok(self.issues[self.position(id)?].clone())
    }

    fn find_by_public_code(&self, code: &str, caller: &Caller) -> Result<Issue> {
        require_authenticated(caller)?;
        self.issues
            .iter()
            .find(|issue| issue.public_code.as_str() == code.trim())
            .cloned()
            .ok_or_else(|| Error::not_found(code))
    }

    fn create(&mut self, draft: IssueDraft, caller: &Caller) -> Result<Issue> {
        require_authenticated(caller)?;
        let Some(citizen) = caller.citizen_id() else {
            return Err(Error::authorization("only citizens may report issues"));
        };
        if citizen != draft.reporter.id {
            return Err(Error::authorization("reporter snapshot does not match the caller"));
        }
        draft.validate()?;

        let now = now_us();
        let sequence = self.next_sequence_for(now.date_naive());
        let issue = build_issue(draft, sequence, now)?;
        tracing::info!(code = %issue.public_code, "issue created");
        self.issues.insert(0, issue.clone());
        Ok(issue)
    }

    fn update(&mut self, id: &str, edit: &IssueEdit, caller: &Caller) -> Result<Issue> {
        let index = self.position(id)?;
        ensure_editable(&self.issues[index])?;
        require_owner(caller, &self.issues[index])?;
        edit.validate()?;

        edit.apply_to(&mut self.issues[index]);
        Ok(self.issues[index].clone())
    }

    fn delete(&mut self, id: &str, caller: &Caller) -> Result<()> {
        let index = self.position(id)?;
        ensure_editable(&self.issues[index])?;
        require_owner(caller, &self.issues[index])?;

        let removed = self.issues.remove(index);
        tracing::info!(code = %removed.public_code, "issue deleted");
        Ok(())
    }

    fn update_status(&mut self, id: &str, to: Status, caller: &Caller) -> Result<Issue> {
        require_admin(caller)?;
        let index = self.position(id)?;
        lifecycle::apply_transition(&mut self.issues[index], to, now_us(), self.policy.as_ref())?;
        Ok(self.issues[index].clone())
    }
}
