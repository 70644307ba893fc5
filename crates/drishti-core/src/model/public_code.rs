//! The human-readable display identifier.
//!
//! Public codes follow `JD-YYYYMMDD-NNNN`: a fixed prefix, the creation
//! date, and a per-day sequence. They are assigned once by the store,
//! shown to citizens in place of the internal id, and never reused.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Fixed prefix for every public code.
pub const CODE_PREFIX: &str = "JD";

/// A validated public display code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicCode(String);

/// Error returned when parsing a malformed public code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePublicCodeError {
    /// The rejected input.
    pub raw: String,
}

impl fmt::Display for ParsePublicCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid public code '{}': expected {CODE_PREFIX}-YYYYMMDD-NNNN",
            self.raw
        )
    }
}

impl std::error::Error for ParsePublicCodeError {}

impl PublicCode {
    /// Construct the code for the `sequence`-th issue created on `date`.
    ///
    /// Sequences are 1-based and zero-padded to four digits; a day with
    /// more than 9999 submissions simply widens the final segment.
    #[must_use]
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        Self(format!("{CODE_PREFIX}-{}-{sequence:04}", date.format("%Y%m%d")))
    }

    /// The code as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The creation date encoded in the code.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        let segment = self.0.split('-').nth(1)?;
        NaiveDate::parse_from_str(segment, "%Y%m%d").ok()
    }

    /// The per-day sequence encoded in the code.
    #[must_use]
    pub fn sequence(&self) -> Option<u32> {
        self.0.split('-').nth(2)?.parse().ok()
    }

    /// Derive the opaque internal issue id for this code.
    ///
    /// Ids are `iss-` plus the first twelve hex characters of the SHA-256
    /// of the code text. Codes are unique, so derived ids are stable and
    /// collision-free for any realistic corpus.
    #[must_use]
    pub fn derive_issue_id(&self) -> String {
        use fmt::Write as _;

        let digest = Sha256::digest(self.0.as_bytes());
        let mut hex = String::with_capacity(12);
        for byte in digest.iter().take(6) {
            let _ = write!(hex, "{byte:02x}");
        }
        format!("iss-{hex}")
    }
}

impl fmt::Display for PublicCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PublicCode {
    type Err = ParsePublicCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let reject = || ParsePublicCodeError { raw: raw.to_string() };

        let mut parts = raw.split('-');
        let prefix = parts.next().ok_or_else(reject)?;
        let date = parts.next().ok_or_else(reject)?;
        let sequence = parts.next().ok_or_else(reject)?;
        if parts.next().is_some() || prefix != CODE_PREFIX {
            return Err(reject());
        }
        if NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
            return Err(reject());
        }
        if sequence.len() < 4 || !sequence.chars().all(|c| c.is_ascii_digit()) {
            return Err(reject());
        }

        Ok(Self(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ParsePublicCodeError, PublicCode};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn format_is_prefix_date_sequence() {
        let code = PublicCode::new(day(2026, 8, 7), 3);
        assert_eq!(code.as_str(), "JD-20260807-0003");
    }

    #[test]
    fn components_roundtrip() {
        let code = PublicCode::new(day(2026, 1, 31), 412);
        assert_eq!(code.date(), Some(day(2026, 1, 31)));
        assert_eq!(code.sequence(), Some(412));
    }

    #[test]
    fn sequence_widens_past_four_digits() {
        let code = PublicCode::new(day(2026, 8, 7), 12345);
        assert_eq!(code.as_str(), "JD-20260807-12345");
        assert_eq!(code.sequence(), Some(12345));
    }

    #[test]
    fn parse_accepts_generated_codes() {
        let code = PublicCode::new(day(2026, 8, 7), 1);
        let reparsed: PublicCode = code.as_str().parse().expect("should parse");
        assert_eq!(reparsed, code);
    }

    #[test]
    fn parse_rejects_malformed_codes() {
        for raw in [
            "",
            "JD",
            "JD-20260807",
            "XX-20260807-0001",
            "JD-2026087-0001",
            "JD-20260807-1",
            "JD-20260807-00a1",
            "JD-20260807-0001-extra",
        ] {
            let err = raw.parse::<PublicCode>().unwrap_err();
            assert_eq!(err, ParsePublicCodeError { raw: raw.to_string() });
        }
    }

    #[test]
    fn derived_ids_are_stable_and_distinct() {
        let a = PublicCode::new(day(2026, 8, 7), 1);
        let b = PublicCode::new(day(2026, 8, 7), 2);

        assert_eq!(a.derive_issue_id(), a.derive_issue_id());
        assert_ne!(a.derive_issue_id(), b.derive_issue_id());
        assert!(a.derive_issue_id().starts_with("iss-"));
        assert_eq!(a.derive_issue_id().len(), "iss-".len() + 12);
    }
}
