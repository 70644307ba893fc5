//! Status transition policy and side effects.
//!
//! The service accepts any admin transition between any two statuses.
//! That permissiveness is the default, but it lives behind
//! [`TransitionPolicy`] so a deployment can swap in [`Strict`] (or its
//! own table) without touching the stores.
//!
//! Entering `Resolved` stamps `resolved_at` with the update time; leaving
//! `Resolved` clears it, keeping the resolution-time invariant a true
//! biconditional.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::Error;
use crate::model::{Issue, Status};

/// Error returned when a policy rejects a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot move issue from {} to {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Decides which status moves an admin may perform.
pub trait TransitionPolicy {
    /// Check whether `from -> to` is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the move is not allowed.
    fn check(&self, from: Status, to: Status) -> Result<(), InvalidTransition>;

    /// Short name used in logs and config echo.
    fn name(&self) -> &'static str;
}

/// Default policy: every move is allowed, identity moves included.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissive;

impl TransitionPolicy for Permissive {
    fn check(&self, _from: Status, _to: Status) -> Result<(), InvalidTransition> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "permissive"
    }
}

/// Opt-in stricter table.
///
/// Allowed moves:
/// - `open -> pending | resolved | rejected`
/// - `pending -> open | resolved | rejected`
/// - `resolved -> open` (reopen)
///
/// `rejected` is terminal and identity moves are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strict;

impl TransitionPolicy for Strict {
    fn check(&self, from: Status, to: Status) -> Result<(), InvalidTransition> {
        if from == to {
            return Err(InvalidTransition {
                from,
                to,
                reason: "issue is already in that status",
            });
        }

        let allowed = matches!(
            (from, to),
            (Status::Open, Status::Pending | Status::Resolved | Status::Rejected)
                | (Status::Pending, Status::Open | Status::Resolved | Status::Rejected)
                | (Status::Resolved, Status::Open)
        );

        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition {
                from,
                to,
                reason: "transition not allowed by lifecycle rules",
            })
        }
    }

    fn name(&self) -> &'static str {
        "strict"
    }
}

/// Select the policy for a configuration flag.
#[must_use]
pub fn configured(strict: bool) -> Box<dyn TransitionPolicy + Send + Sync> {
    if strict { Box::new(Strict) } else { Box::new(Permissive) }
}

/// Apply a status move to `issue`, stamping side effects.
///
/// Returns the previous status. `resolved_at` is set to `at` when the
/// issue enters `Resolved` (an identity move keeps the original stamp)
/// and cleared when it leaves.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the policy rejects the move.
pub fn apply_transition(
    issue: &mut Issue,
    to: Status,
    at: DateTime<Utc>,
    policy: &dyn TransitionPolicy,
) -> Result<Status, Error> {
    policy
        .check(issue.status, to)
        .map_err(|e| Error::validation(e.to_string()))?;

    let from = issue.status;
    issue.status = to;
    issue.resolved_at = match (from, to) {
        (Status::Resolved, Status::Resolved) => issue.resolved_at,
        (_, Status::Resolved) => Some(at),
        _ => None,
    };

    tracing::debug!(issue = %issue.public_code, %from, %to, policy = policy.name(), "status transition");
    Ok(from)
}

#[cfg(test)]
mod tests {
    use super::{Permissive, Strict, TransitionPolicy, apply_transition, configured};
    use crate::model::Status;
    use crate::model::issue::tests::sample_issue;
    use chrono::Utc;

    #[test]
    fn permissive_allows_every_pair() {
        for from in Status::ALL {
            for to in Status::ALL {
                assert!(Permissive.check(from, to).is_ok(), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn strict_blocks_identity_and_rejected_exits() {
        assert!(Strict.check(Status::Open, Status::Open).is_err());
        assert!(Strict.check(Status::Rejected, Status::Open).is_err());
        assert!(Strict.check(Status::Resolved, Status::Pending).is_err());

        assert!(Strict.check(Status::Open, Status::Pending).is_ok());
        assert!(Strict.check(Status::Pending, Status::Rejected).is_ok());
        assert!(Strict.check(Status::Resolved, Status::Open).is_ok());
    }

    #[test]
    fn entering_resolved_stamps_resolution_time() {
        let mut issue = sample_issue();
        let at = Utc::now();
        let from = apply_transition(&mut issue, Status::Resolved, at, &Permissive)
            .expect("transition allowed");
        assert_eq!(from, Status::Open);
        assert_eq!(issue.status, Status::Resolved);
        assert_eq!(issue.resolved_at, Some(at));
    }

    #[test]
    fn leaving_resolved_clears_resolution_time() {
        let mut issue = sample_issue();
        apply_transition(&mut issue, Status::Resolved, Utc::now(), &Permissive)
            .expect("resolve");
        apply_transition(&mut issue, Status::Open, Utc::now(), &Permissive).expect("reopen");
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.resolved_at, None);
    }

    #[test]
    fn resolved_identity_move_keeps_original_stamp() {
        let mut issue = sample_issue();
        let first = Utc::now();
        apply_transition(&mut issue, Status::Resolved, first, &Permissive).expect("resolve");
        apply_transition(&mut issue, Status::Resolved, Utc::now(), &Permissive)
            .expect("identity move allowed under permissive");
        assert_eq!(issue.resolved_at, Some(first));
    }

    #[test]
    fn non_resolved_moves_never_carry_a_stamp() {
        let mut issue = sample_issue();
        apply_transition(&mut issue, Status::Pending, Utc::now(), &Permissive).expect("pend");
        assert_eq!(issue.resolved_at, None);
        apply_transition(&mut issue, Status::Rejected, Utc::now(), &Permissive).expect("reject");
        assert_eq!(issue.resolved_at, None);
    }

    #[test]
    fn strict_rejection_maps_to_validation_error() {
        let mut issue = sample_issue();
        issue.status = Status::Rejected;
        let err = apply_transition(&mut issue, Status::Open, Utc::now(), &Strict).unwrap_err();
        assert_eq!(err.code(), "E1001");
        assert_eq!(issue.status, Status::Rejected, "issue unchanged on rejection");
    }

    #[test]
    fn configured_selects_by_flag() {
        assert_eq!(configured(false).name(), "permissive");
        assert_eq!(configured(true).name(), "strict");
    }
}
