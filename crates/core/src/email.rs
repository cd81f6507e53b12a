//! Email address value object.
//!
//! Compared by value. Construction normalizes (trim + lowercase) so that the
//! uniqueness constraint in the credential store is case-insensitive.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Longest address accepted (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validate and normalize a raw address.
    ///
    /// Only shallow checks are made: non-empty, a single `@` with text on both
    /// sides, no whitespace, bounded length.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if normalized.chars().count() > MAX_EMAIL_LENGTH {
            return Err(DomainError::validation(format!(
                "email must be at most {MAX_EMAIL_LENGTH} characters"
            )));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email must not contain whitespace"));
        }

        match normalized.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(Self(normalized))
            }
            _ => Err(DomainError::validation("email is not a valid address")),
        }
    }

    /// Wrap an address that was already validated (e.g. read back from the store).
    pub fn from_trusted(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let email = Email::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn rejects_empty_and_malformed() {
        for raw in ["", "   ", "no-at-sign", "@example.com", "alice@", "a@b@c", "a b@c.com"] {
            assert!(
                matches!(Email::parse(raw), Err(DomainError::Validation(_))),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_address() {
        let raw = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(Email::parse(&raw).is_err());
    }

    #[test]
    fn length_limit_counts_characters() {
        // 240 two-byte chars: within the limit in characters, over it in bytes.
        let raw = format!("{}@example.com", "é".repeat(240));
        assert!(raw.len() > MAX_EMAIL_LENGTH);
        assert!(raw.chars().count() <= MAX_EMAIL_LENGTH);
        assert!(Email::parse(&raw).is_ok());

        let raw = format!("{}@example.com", "é".repeat(MAX_EMAIL_LENGTH));
        let err = Email::parse(&raw).unwrap_err();
        assert_eq!(err.detail(), format!("email must be at most {MAX_EMAIL_LENGTH} characters"));
    }

    proptest! {
        #[test]
        fn parse_is_idempotent(local in "[a-zA-Z0-9._]{1,20}", domain in "[a-zA-Z0-9]{1,20}\\.[a-z]{2,4}") {
            let first = Email::parse(&format!("{local}@{domain}")).unwrap();
            let second = Email::parse(first.as_str()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
