//! Caller identity resolution.
//!
//! Commands act as an admin or as a citizen. The identity comes from the
//! global `--as` flag, then the `DRISHTI_AS` environment variable; when
//! neither is set the caller is anonymous and protected operations fail
//! with an authentication error, exactly as an expired web credential
//! would.
//!
//! Accepted forms: `admin`, `admin:<name>`, `citizen:<id>`.

use anyhow::{Result, bail};
use drishti_core::store::Caller;

/// Environment variable consulted when `--as` is absent.
pub const IDENTITY_ENV: &str = "DRISHTI_AS";

/// Resolve the caller identity from the flag and environment.
pub fn resolve_identity(flag: Option<&str>) -> Result<Caller> {
    let raw = match flag {
        Some(value) => Some(value.to_string()),
        None => std::env::var(IDENTITY_ENV).ok(),
    };
    match raw {
        Some(value) => parse_identity(&value),
        None => Ok(Caller::Anonymous),
    }
}

fn parse_identity(raw: &str) -> Result<Caller> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Caller::Anonymous);
    }

    match trimmed.split_once(':') {
        None if trimmed == "admin" => Ok(Caller::Admin { name: "admin".to_string() }),
        Some(("admin", name)) if !name.trim().is_empty() => {
            Ok(Caller::Admin { name: name.trim().to_string() })
        }
        Some(("citizen", id)) if !id.trim().is_empty() => {
            Ok(Caller::Citizen { id: id.trim().to_string() })
        }
        _ => bail!(
            "invalid identity '{trimmed}': expected 'admin', 'admin:<name>', or 'citizen:<id>'"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_identity;
    use drishti_core::store::Caller;

    #[test]
    fn admin_forms_parse() {
        assert_eq!(
            parse_identity("admin").expect("parse"),
            Caller::Admin { name: "admin".to_string() }
        );
        assert_eq!(
            parse_identity("admin:nisha").expect("parse"),
            Caller::Admin { name: "nisha".to_string() }
        );
    }

    #[test]
    fn citizen_form_parses() {
        assert_eq!(
            parse_identity("citizen:usr-17").expect("parse"),
            Caller::Citizen { id: "usr-17".to_string() }
        );
    }

    #[test]
    fn blank_is_anonymous() {
        assert_eq!(parse_identity("  ").expect("parse"), Caller::Anonymous);
    }

    #[test]
    fn malformed_identities_are_rejected() {
        for raw in ["citizen", "citizen:", "admin: ", "root:alice", "usr-17"] {
            assert!(parse_identity(raw).is_err(), "should reject '{raw}'");
        }
    }
}
