//! Error taxonomy for the lifecycle core.
//!
//! Five recoverable categories plus an internal store bucket. Each carries
//! a stable machine code (`E####`) so agent-facing callers can branch
//! without string-matching messages.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error taxonomy shared by the store contract, sessions, and the CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input. Recovered locally by re-prompting the
    /// user; never a system failure.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, expired, or rejected credential. Sessions tear down on
    /// receipt and force a re-authentication.
    #[error("authentication required: {0}")]
    Authentication(String),

    /// Authenticated but not permitted. Surfaced to the user; the session
    /// is preserved.
    #[error("not permitted: {0}")]
    Authorization(String),

    /// The referenced issue does not exist.
    #[error("issue not found: {0}")]
    NotFound(String),

    /// Transport failure. Retryable by the caller; the core performs no
    /// automatic retry.
    #[error("network failure: {0}")]
    Network(String),

    /// Internal store failure (corruption, I/O, SQL).
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    /// Build a [`Error::Validation`] from anything stringy.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`Error::Authentication`] from anything stringy.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Build a [`Error::Authorization`] from anything stringy.
    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Build a [`Error::NotFound`] for an issue id or public code.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E1001",
            Self::Authentication(_) => "E2001",
            Self::Authorization(_) => "E2002",
            Self::NotFound(_) => "E3001",
            Self::Network(_) => "E4001",
            Self::Store(_) => "E5001",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Validation(_) => Some("Correct the highlighted fields and resubmit."),
            Self::Authentication(_) => Some("Log in again to obtain a fresh credential."),
            Self::Authorization(_) => None,
            Self::NotFound(_) => None,
            Self::Network(_) => Some("Check connectivity and retry."),
            Self::Store(_) => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// Returns `true` for errors that must trigger session teardown.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use std::collections::HashSet;

    fn all() -> Vec<Error> {
        vec![
            Error::validation("title is required"),
            Error::authentication("token expired"),
            Error::authorization("admin capability required"),
            Error::not_found("iss-0123456789ab"),
            Error::Network("connection refused".to_string()),
            Error::Store(anyhow::anyhow!("disk full")),
        ]
    }

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for err in all() {
            assert!(seen.insert(err.code()), "duplicate code {}", err.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for err in all() {
            let code = err.code();
            assert_eq!(code.len(), 5);
            assert!(code.starts_with('E'));
            assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_carries_the_message() {
        let err = Error::validation("location is required");
        assert_eq!(err.to_string(), "validation failed: location is required");
    }

    #[test]
    fn only_authentication_tears_down_sessions() {
        for err in all() {
            assert_eq!(err.is_authentication(), matches!(err, Error::Authentication(_)));
        }
    }
}
