//! Client issue cache and event reconciliation.
//!
//! Each connected client holds a view-scoped, possibly stale copy of the
//! issues it is displaying. The cache has exactly two writers: the
//! seeding fetch and [`IssueCache::apply`], which merges pushed events in
//! arrival order.
//!
//! Merge rules (the consistency contract):
//! - `new_issue`: head-insert unless the id is already present
//!   (idempotent against duplicate delivery).
//! - `status_updated`: partial merge of `status` and `resolved_at` only;
//!   every other cached field is kept. An absent id is a deliberate
//!   no-op: the cache mirrors a filtered view, not the whole store.
//!
//! No sequence numbers are used: reordered deliveries can leave an
//! intermediate status visible until the next event or fetch. That is an
//! accepted weak-consistency tradeoff; strict convergence would need a
//! per-issue version counter.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use crate::event::RealtimeEvent;
use crate::model::Issue;

/// Outcome of applying one event to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new issue was inserted at the head.
    Inserted,
    /// The create was a duplicate delivery; nothing changed.
    Duplicate,
    /// An existing entry's status fields were merged in place.
    Updated,
    /// The event's id is not in this view; nothing changed.
    NotCached,
}

impl Applied {
    /// Returns `true` if the cache contents changed.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Inserted | Self::Updated)
    }
}

/// The in-memory, view-scoped issue collection, newest first.
#[derive(Debug, Default)]
pub struct IssueCache {
    issues: Vec<Issue>,
}

impl IssueCache {
    /// Create an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Replace the whole collection with a fetch result.
    pub fn seed(&mut self, issues: Vec<Issue>) {
        self.issues = issues;
    }

    /// Drop every cached entry (session teardown).
    pub fn clear(&mut self) {
        self.issues.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// The cached issues, newest first.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Look up a cached entry by internal id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    /// Merge one pushed event into the cache.
    pub fn apply(&mut self, event: &RealtimeEvent) -> Applied {
        match event {
            RealtimeEvent::IssueCreated(issue) => {
                if self.get(&issue.id).is_some() {
                    tracing::debug!(id = %issue.id, "duplicate create delivery ignored");
                    return Applied::Duplicate;
                }
                self.issues.insert(0, (**issue).clone());
                Applied::Inserted
            }
            RealtimeEvent::StatusChanged(change) => {
                let Some(entry) = self.issues.iter_mut().find(|i| i.id == change.id) else {
                    tracing::debug!(id = %change.id, "status event for uncached issue ignored");
                    return Applied::NotCached;
                };
                entry.status = change.status;
                entry.resolved_at = change.resolved_at;
                Applied::Updated
            }
        }
    }
}

/// Severity of a transient notice, mapped to the view layer's banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Success,
}

/// A transient, advisory notification surfaced to the view layer.
///
/// Notices carry no state obligation and expire on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub severity: NoticeSeverity,
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    /// Build the notice for a pushed event, expiring `ttl` after `now`.
    #[must_use]
    pub fn for_event(event: &RealtimeEvent, now: DateTime<Utc>, ttl: Duration) -> Self {
        let (text, severity) = match event {
            RealtimeEvent::IssueCreated(issue) => (
                format!("New issue reported: {} ({})", issue.public_code, issue.title),
                NoticeSeverity::Info,
            ),
            RealtimeEvent::StatusChanged(change) => (
                format!(
                    "Issue {} status changed to {}",
                    change.public_code,
                    change.status.as_str().to_uppercase()
                ),
                NoticeSeverity::Success,
            ),
        };
        Self { text, severity, expires_at: now + ttl }
    }

    /// Returns `true` while the notice should still be shown.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// FIFO queue of live notices; expired entries are pruned on access.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    notices: VecDeque<Notice>,
}

impl NoticeQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self { notices: VecDeque::new() }
    }

    pub fn push(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    /// Drop expired notices and return the ones still active at `now`.
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<Notice> {
        self.notices.retain(|n| n.is_active(now));
        self.notices.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Applied, IssueCache, Notice, NoticeQueue, NoticeSeverity};
    use crate::event::{RealtimeEvent, StatusChange};
    use crate::model::Status;
    use crate::model::issue::tests::sample_issue;
    use chrono::{Duration, Utc};

    fn created_event() -> RealtimeEvent {
        RealtimeEvent::IssueCreated(Box::new(sample_issue()))
    }

    fn status_event(id: &str, status: Status) -> RealtimeEvent {
        let issue = sample_issue();
        RealtimeEvent::StatusChanged(StatusChange {
            id: id.to_string(),
            public_code: issue.public_code,
            reporter_id: issue.reporter.id,
            status,
            resolved_at: None,
        })
    }

    #[test]
    fn create_inserts_at_head() {
        let mut cache = IssueCache::new();
        let mut older = sample_issue();
        older.id = "iss-older".to_string();
        cache.seed(vec![older]);

        assert_eq!(cache.apply(&created_event()), Applied::Inserted);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.issues()[0].id, sample_issue().id);
    }

    #[test]
    fn duplicate_create_is_idempotent() {
        let mut cache = IssueCache::new();
        assert_eq!(cache.apply(&created_event()), Applied::Inserted);
        assert_eq!(cache.apply(&created_event()), Applied::Duplicate);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn status_merge_touches_only_status_fields() {
        let mut cache = IssueCache::new();
        let issue = sample_issue();
        cache.seed(vec![issue.clone()]);

        cache.apply(&status_event(&issue.id, Status::Pending));

        let entry = cache.get(&issue.id).expect("still cached");
        assert_eq!(entry.status, Status::Pending);
        assert_eq!(entry.resolved_at, None);
        // Everything the lightweight event does not carry is preserved.
        assert_eq!(entry.title, issue.title);
        assert_eq!(entry.description, issue.description);
        assert_eq!(entry.media, issue.media);
        assert_eq!(entry.created_at, issue.created_at);
    }

    #[test]
    fn status_for_uncached_id_is_a_noop() {
        let mut cache = IssueCache::new();
        cache.seed(vec![sample_issue()]);
        let before = cache.issues().to_vec();

        let outcome = cache.apply(&status_event("iss-unknown", Status::Resolved));

        assert_eq!(outcome, Applied::NotCached);
        assert_eq!(cache.issues(), before.as_slice());
    }

    #[test]
    fn last_delivered_event_wins() {
        let mut cache = IssueCache::new();
        let issue = sample_issue();
        cache.seed(vec![issue.clone()]);

        cache.apply(&status_event(&issue.id, Status::Pending));
        cache.apply(&status_event(&issue.id, Status::Rejected));
        cache.apply(&status_event(&issue.id, Status::Open));

        assert_eq!(cache.get(&issue.id).expect("cached").status, Status::Open);
    }

    #[test]
    fn resolved_event_carries_the_timestamp_into_the_cache() {
        let mut cache = IssueCache::new();
        let issue = sample_issue();
        cache.seed(vec![issue.clone()]);
        let at = Utc::now();

        let mut event = status_event(&issue.id, Status::Resolved);
        if let RealtimeEvent::StatusChanged(change) = &mut event {
            change.resolved_at = Some(at);
        }
        cache.apply(&event);

        assert_eq!(cache.get(&issue.id).expect("cached").resolved_at, Some(at));
    }

    #[test]
    fn applied_changed_flags_mutations_only() {
        assert!(Applied::Inserted.changed());
        assert!(Applied::Updated.changed());
        assert!(!Applied::Duplicate.changed());
        assert!(!Applied::NotCached.changed());
    }

    #[test]
    fn notice_text_names_the_public_code() {
        let now = Utc::now();
        let notice = Notice::for_event(&created_event(), now, Duration::seconds(5));
        assert!(notice.text.contains("JD-20260807-0001"));
        assert!(notice.text.contains("Road potholes"));
        assert_eq!(notice.severity, NoticeSeverity::Info);

        let issue = sample_issue();
        let notice = Notice::for_event(&status_event(&issue.id, Status::Resolved), now, Duration::seconds(5));
        assert!(notice.text.contains("RESOLVED"));
        assert_eq!(notice.severity, NoticeSeverity::Success);
    }

    #[test]
    fn notices_expire_after_their_ttl() {
        let now = Utc::now();
        let mut queue = NoticeQueue::new();
        queue.push(Notice::for_event(&created_event(), now, Duration::seconds(5)));

        assert_eq!(queue.active(now).len(), 1);
        assert_eq!(queue.active(now + Duration::seconds(4)).len(), 1);
        assert!(queue.active(now + Duration::seconds(6)).is_empty());
        assert!(queue.is_empty(), "expired notices are pruned");
    }
}
