//! The authoritative backend facade: a store plus the push channel.
//!
//! The Issue Store owns the records; the channel fans mutations out to
//! connected clients. Coupling the two here keeps the event contract in
//! one place: `create` publishes `new_issue`, `update_status` publishes
//! `status_updated`, and nothing else emits events.

use crate::channel::RealtimeChannel;
use crate::error::Result;
use crate::event::{RealtimeEvent, StatusChange};
use crate::model::{Issue, Status};
use crate::store::{Caller, IssueDraft, IssueEdit, IssueFilter, IssueStore};

/// The backend as seen by clients: CRUD plus push events.
pub struct Backend<S: IssueStore> {
    store: S,
    channel: RealtimeChannel,
}

impl<S: IssueStore> Backend<S> {
    /// Wrap a store. The channel starts disconnected; call
    /// [`RealtimeChannel::connect`] via [`Backend::channel_mut`] to begin
    /// delivery.
    pub fn new(store: S) -> Self {
        Self { store, channel: RealtimeChannel::new() }
    }

    /// Wrap a store with delivery already enabled.
    pub fn connected(store: S) -> Self {
        let mut backend = Self::new(store);
        backend.channel.connect();
        backend
    }

    #[must_use]
    pub const fn channel(&self) -> &RealtimeChannel {
        &self.channel
    }

    pub const fn channel_mut(&mut self) -> &mut RealtimeChannel {
        &mut self.channel
    }

    /// List issues matching `filter` (admin).
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub fn list(&self, filter: &IssueFilter, caller: &Caller) -> Result<Vec<Issue>> {
        self.store.list(filter, caller)
    }

    /// List one citizen's issues.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub fn list_for_reporter(&self, reporter_id: &str, caller: &Caller) -> Result<Vec<Issue>> {
        self.store.list_for_reporter(reporter_id, caller)
    }

    /// Fetch one issue by internal id.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub fn get(&self, id: &str, caller: &Caller) -> Result<Issue> {
        self.store.get(id, caller)
    }

    /// Exact lookup by public display code.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub fn find_by_public_code(&self, code: &str, caller: &Caller) -> Result<Issue> {
        self.store.find_by_public_code(code, caller)
    }

    /// Create an issue and announce it to subscribers.
    ///
    /// # Errors
    ///
    /// Propagates store errors; no event is published on failure.
    pub fn create(&mut self, draft: IssueDraft, caller: &Caller) -> Result<Issue> {
        let issue = self.store.create(draft, caller)?;
        self.channel
            .publish(&RealtimeEvent::IssueCreated(Box::new(issue.clone())));
        Ok(issue)
    }

    /// Edit an issue. Edits are not part of the push catalog.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub fn update(&mut self, id: &str, edit: &IssueEdit, caller: &Caller) -> Result<Issue> {
        self.store.update(id, edit, caller)
    }

    /// Delete an issue. Deletes are not part of the push catalog.
    ///
    /// # Errors
    ///
    /// Propagates store errors unchanged.
    pub fn delete(&mut self, id: &str, caller: &Caller) -> Result<()> {
        self.store.delete(id, caller)
    }

    /// Change an issue's status and announce the delta to subscribers.
    ///
    /// # Errors
    ///
    /// Propagates store errors; no event is published on failure.
    pub fn update_status(&mut self, id: &str, to: Status, caller: &Caller) -> Result<Issue> {
        let issue = self.store.update_status(id, to, caller)?;
        self.channel.publish(&RealtimeEvent::StatusChanged(StatusChange {
            id: issue.id.clone(),
            public_code: issue.public_code.clone(),
            reporter_id: issue.reporter.id.clone(),
            status: issue.status,
            resolved_at: issue.resolved_at,
        }));
        Ok(issue)
    }
}
