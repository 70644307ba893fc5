//! Per-client session state: cache, filter, pagination, notices.
//!
//! A session is what a mounted dashboard owns. It seeds its cache with a
//! fetch, subscribes to the push channel, reconciles drained events in
//! arrival order, and pages client-side over the full cached result set.
//!
//! Authentication failures tear the session down (unsubscribe, clear the
//! credential, reset the cache) as a side effect of error handling, then
//! propagate so the view layer can redirect to login.

use chrono::{DateTime, Duration, Utc};

use crate::backend::Backend;
use crate::cache::{IssueCache, Notice, NoticeQueue};
use crate::channel::SubscriptionId;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::event::{EventKind, RealtimeEvent};
use crate::model::Issue;
use crate::store::{Caller, IssueFilter, IssueStore};

/// What slice of the store a session mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewScope {
    /// Every issue (admin dashboards).
    AllIssues,
    /// One citizen's issues.
    Reporter(String),
}

/// One connected client's view state.
pub struct ClientSession {
    caller: Caller,
    scope: ViewScope,
    filter: IssueFilter,
    page: usize,
    page_size: usize,
    notice_ttl: Duration,
    cache: IssueCache,
    notices: NoticeQueue,
    subscription: Option<SubscriptionId>,
}

impl ClientSession {
    /// Admin session over the full issue set.
    #[must_use]
    pub fn admin(name: impl Into<String>, config: &ClientConfig) -> Self {
        Self::new(Caller::Admin { name: name.into() }, ViewScope::AllIssues, config)
    }

    /// Citizen session scoped to the citizen's own issues.
    #[must_use]
    pub fn citizen(id: impl Into<String>, config: &ClientConfig) -> Self {
        let id = id.into();
        Self::new(
            Caller::Citizen { id: id.clone() },
            ViewScope::Reporter(id),
            config,
        )
    }

    fn new(caller: Caller, scope: ViewScope, config: &ClientConfig) -> Self {
        Self {
            caller,
            scope,
            filter: IssueFilter::default(),
            page: 0,
            page_size: config.page_size.max(1),
            notice_ttl: Duration::seconds(i64::try_from(config.notice_ttl_secs).unwrap_or(i64::MAX)),
            cache: IssueCache::new(),
            notices: NoticeQueue::new(),
            subscription: None,
        }
    }

    #[must_use]
    pub const fn caller(&self) -> &Caller {
        &self.caller
    }

    #[must_use]
    pub const fn scope(&self) -> &ViewScope {
        &self.scope
    }

    #[must_use]
    pub const fn filter(&self) -> &IssueFilter {
        &self.filter
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribe to push events and run the seeding fetch.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures; an authentication failure tears the
    /// session down first.
    pub fn connect<S: IssueStore>(&mut self, backend: &mut Backend<S>) -> Result<()> {
        if self.subscription.is_none() {
            self.subscription = Some(backend.channel_mut().subscribe(&EventKind::ALL));
        }
        self.refresh(backend)
    }

    /// Re-run the scoped fetch with the current filter.
    ///
    /// # Errors
    ///
    /// As for [`ClientSession::connect`].
    pub fn refresh<S: IssueStore>(&mut self, backend: &mut Backend<S>) -> Result<()> {
        let fetched = match &self.scope {
            ViewScope::AllIssues => backend.list(&self.filter, &self.caller),
            ViewScope::Reporter(id) => backend.list_for_reporter(id, &self.caller),
        };
        match fetched {
            Ok(issues) => {
                self.cache.seed(issues);
                self.clamp_page();
                Ok(())
            }
            Err(err) => Err(self.fail(backend, err)),
        }
    }

    /// Apply a new filter/search and re-fetch. Always resets to the
    /// first page, even when the fetch fails.
    ///
    /// # Errors
    ///
    /// As for [`ClientSession::refresh`].
    pub fn apply_filter<S: IssueStore>(
        &mut self,
        backend: &mut Backend<S>,
        filter: IssueFilter,
    ) -> Result<()> {
        self.filter = filter;
        self.page = 0;
        self.refresh(backend)
    }

    /// Drain the subscription and reconcile every event in arrival
    /// order. Returns the number of events that changed the cache.
    pub fn pump<S: IssueStore>(&mut self, backend: &mut Backend<S>, now: DateTime<Utc>) -> usize {
        let Some(subscription) = self.subscription else {
            return 0;
        };

        let mut changed = 0;
        for event in backend.channel_mut().drain(subscription) {
            if !self.in_scope(&event) {
                continue;
            }
            let outcome = self.cache.apply(&event);
            if outcome.changed() {
                changed += 1;
                self.notices.push(Notice::for_event(&event, now, self.notice_ttl));
            }
            tracing::trace!(kind = %event.kind(), ?outcome, "event reconciled");
        }
        self.clamp_page();
        changed
    }

    fn in_scope(&self, event: &RealtimeEvent) -> bool {
        match &self.scope {
            ViewScope::AllIssues => true,
            ViewScope::Reporter(id) => event.reporter_id() == id,
        }
    }

    /// The cached issues backing the current view, newest first.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        self.cache.issues()
    }

    /// The slice for the current page.
    #[must_use]
    pub fn page_items(&self) -> &[Issue] {
        let issues = self.cache.issues();
        let start = self.page * self.page_size;
        let end = (start + self.page_size).min(issues.len());
        issues.get(start..end).unwrap_or_default()
    }

    /// Zero-based current page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Number of pages for the current cache contents (at least one).
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.cache.len().div_ceil(self.page_size).max(1)
    }

    /// Move to the next page, saturating at the last.
    pub fn next_page(&mut self) {
        self.page = (self.page + 1).min(self.page_count() - 1);
    }

    /// Move to the previous page, saturating at the first.
    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    fn clamp_page(&mut self) {
        self.page = self.page.min(self.page_count() - 1);
    }

    /// Active transient notices at `now` (expired ones are pruned).
    pub fn notices(&mut self, now: DateTime<Utc>) -> Vec<Notice> {
        self.notices.active(now)
    }

    /// Tear the session down: unsubscribe, clear the credential, reset
    /// cache and notices.
    pub fn logout<S: IssueStore>(&mut self, backend: &mut Backend<S>) {
        if let Some(subscription) = self.subscription.take() {
            backend.channel_mut().unsubscribe(subscription);
        }
        self.caller = Caller::Anonymous;
        self.cache.clear();
        self.notices.clear();
        self.page = 0;
        tracing::debug!("session torn down");
    }

    fn fail<S: IssueStore>(&mut self, backend: &mut Backend<S>, err: Error) -> Error {
        if err.is_authentication() {
            tracing::warn!(code = err.code(), "authentication failure: tearing session down");
            self.logout(backend);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::ClientSession;
    use crate::backend::Backend;
    use crate::config::ClientConfig;
    use crate::error::Error;
    use crate::model::Status;
    use crate::model::issue::tests::sample_issue;
    use crate::store::{Caller, IssueDraft, IssueFilter, MemoryStore};
    use chrono::Utc;

    fn citizen() -> Caller {
        Caller::Citizen { id: "usr-17".to_string() }
    }

    fn admin_caller() -> Caller {
        Caller::Admin { name: "nisha".to_string() }
    }

    fn draft(title: &str) -> IssueDraft {
        let issue = sample_issue();
        IssueDraft {
            title: title.to_string(),
            description: issue.description,
            location: issue.location,
            occurred_on: Some(issue.occurred_on),
            media: issue.media,
            reporter: issue.reporter,
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    #[test]
    fn connect_seeds_the_cache() {
        let mut backend = Backend::connected(MemoryStore::new());
        backend.create(draft("Seeded"), &citizen()).expect("create");

        let mut session = ClientSession::admin("nisha", &config());
        session.connect(&mut backend).expect("connect");
        assert_eq!(session.issues().len(), 1);
        assert!(session.is_connected());
    }

    #[test]
    fn pump_reconciles_new_issues_and_status_changes() {
        let mut backend = Backend::connected(MemoryStore::new());
        let mut session = ClientSession::admin("nisha", &config());
        session.connect(&mut backend).expect("connect");

        let created = backend.create(draft("Live"), &citizen()).expect("create");
        backend
            .update_status(&created.id, Status::Pending, &admin_caller())
            .expect("update");

        let changed = session.pump(&mut backend, Utc::now());
        assert_eq!(changed, 2);
        assert_eq!(session.issues()[0].status, Status::Pending);

        let notices = session.notices(Utc::now());
        assert_eq!(notices.len(), 2);
        assert!(notices[1].text.contains("PENDING"));
    }

    #[test]
    fn citizen_sessions_ignore_other_reporters_events() {
        let mut backend = Backend::connected(MemoryStore::new());
        let mut session = ClientSession::citizen("usr-99", &config());
        session.connect(&mut backend).expect("connect");

        backend.create(draft("Not mine"), &citizen()).expect("create");
        let changed = session.pump(&mut backend, Utc::now());
        assert_eq!(changed, 0);
        assert!(session.issues().is_empty());
        assert!(session.notices(Utc::now()).is_empty());
    }

    #[test]
    fn filter_application_resets_to_the_first_page() {
        let mut backend = Backend::connected(MemoryStore::new());
        for i in 0..30 {
            backend.create(draft(&format!("Issue {i}")), &citizen()).expect("create");
        }

        let mut session = ClientSession::admin("nisha", &config());
        session.connect(&mut backend).expect("connect");
        session.next_page();
        assert_eq!(session.page(), 1);

        session
            .apply_filter(&mut backend, IssueFilter::by_search("Issue 2"))
            .expect("filter");
        assert_eq!(session.page(), 0);
        assert!(!session.issues().is_empty());
    }

    #[test]
    fn pagination_is_fixed_size_over_the_full_result() {
        let mut backend = Backend::connected(MemoryStore::new());
        for i in 0..30 {
            backend.create(draft(&format!("Issue {i}")), &citizen()).expect("create");
        }

        let mut session = ClientSession::admin("nisha", &config());
        session.connect(&mut backend).expect("connect");

        assert_eq!(session.page_count(), 3);
        assert_eq!(session.page_items().len(), 12);
        session.next_page();
        session.next_page();
        assert_eq!(session.page_items().len(), 6);
        session.next_page();
        assert_eq!(session.page(), 2, "saturates at the last page");
    }

    #[test]
    fn authentication_failure_tears_the_session_down() {
        let mut backend = Backend::connected(MemoryStore::new());
        let mut session = ClientSession::admin("nisha", &config());
        session.connect(&mut backend).expect("connect");

        // Simulate credential rejection: an anonymous session refreshing.
        session.logout(&mut backend);
        let mut anon = ClientSession::admin("nisha", &config());
        anon.connect(&mut backend).expect("connect");
        anon.caller = Caller::Anonymous;

        let err = anon.refresh(&mut backend).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(!anon.is_connected(), "subscription released");
        assert!(anon.issues().is_empty(), "cache reset");
        assert_eq!(backend.channel().subscriber_count(), 0);
    }

    #[test]
    fn logout_releases_the_subscription() {
        let mut backend = Backend::connected(MemoryStore::new());
        let mut session = ClientSession::admin("nisha", &config());
        session.connect(&mut backend).expect("connect");
        assert_eq!(backend.channel().subscriber_count(), 1);

        session.logout(&mut backend);
        assert_eq!(backend.channel().subscriber_count(), 0);
        assert!(matches!(session.caller(), Caller::Anonymous));
    }
}
