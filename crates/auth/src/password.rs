//! Password hashing and validation (bcrypt).
//!
//! Hashing is CPU-bound: callers on an async runtime should run
//! [`PasswordHasher::hash`] and [`PasswordHasher::verify`] on a blocking pool.

use bcrypt::{DEFAULT_COST, hash, verify};
use thiserror::Error;

use fintrack_core::{DomainError, DomainResult};

/// Lowest cost bcrypt accepts. Only suitable for tests.
pub const MIN_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;

/// bcrypt only looks at the first 72 bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

const DUMMY_PASSWORD: &str = "fintrack-timing-equalizer";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {0}")]
    InvalidCost(u32),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Check a plaintext password before it is hashed.
pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(DomainError::validation(format!(
            "password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// bcrypt hasher with a fixed work factor.
///
/// Holds a pre-computed hash of a throwaway password at the same cost, so an
/// unknown-account login can spend one real verification without hashing first.
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        let dummy_hash = hash_with_cost(DUMMY_PASSWORD, cost)?;
        Ok(Self { cost, dummy_hash })
    }

    /// Hasher at bcrypt's own default cost.
    pub fn with_default_cost() -> Result<Self, PasswordError> {
        Self::new(DEFAULT_COST)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Produce a salted, self-describing hash (`$2b$<cost>$<salt+digest>`).
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with_cost(password, self.cost)
    }

    /// `true` iff `candidate` matches `hashed`. A malformed hash never matches.
    pub fn verify(&self, hashed: &str, candidate: &str) -> bool {
        match verify(candidate, hashed) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash could not be parsed");
                false
            }
        }
    }

    /// Spend the same work as a real verification and return `false`.
    ///
    /// Used when the account does not exist, so response time does not reveal
    /// whether an email is registered.
    pub fn verify_dummy(&self, candidate: &str) -> bool {
        let _ = verify(candidate, &self.dummy_hash);
        false
    }
}

// Never print the dummy hash.
impl core::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordHasher").field("cost", &self.cost).finish()
    }
}

fn hash_with_cost(password: &str, cost: u32) -> Result<String, PasswordError> {
    let hashed = hash(password, cost).map_err(|e| PasswordError::Hash(e.to_string()))?;
    if hashed.is_empty() {
        return Err(PasswordError::Hash("bcrypt returned an empty hash".to_string()));
    }
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_COST).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let h = hasher();
        let hashed = h.hash("secret123").unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(!hashed.contains("secret123"));
        assert!(h.verify(&hashed, "secret123"));
        assert!(!h.verify(&hashed, "secret124"));
    }

    #[test]
    fn hashes_are_salted() {
        let h = hasher();
        let a = h.hash("same-password").unwrap();
        let b = h.hash("same-password").unwrap();
        assert_ne!(a, b);
        assert!(h.verify(&a, "same-password"));
        assert!(h.verify(&b, "same-password"));
    }

    #[test]
    fn hash_embeds_cost() {
        let hashed = hasher().hash("pw").unwrap();
        assert!(hashed.contains("$04$"), "{hashed}");
    }

    #[test]
    fn malformed_hash_is_false_not_error() {
        let h = hasher();
        assert!(!h.verify("", "secret123"));
        assert!(!h.verify("not-a-bcrypt-hash", "secret123"));
        assert!(!h.verify("$2b$04$short", "secret123"));
    }

    #[test]
    fn dummy_verification_never_matches() {
        let h = hasher();
        assert!(!h.verify_dummy(DUMMY_PASSWORD));
        assert!(!h.verify_dummy("anything"));
    }

    #[test]
    fn dummy_hash_is_built_up_front_at_the_configured_cost() {
        let h = hasher();
        assert!(h.dummy_hash.starts_with("$2"));
        assert!(h.dummy_hash.contains("$04$"), "{}", h.dummy_hash);
        assert!(verify(DUMMY_PASSWORD, &h.dummy_hash).unwrap());
        assert!(!format!("{h:?}").contains(&h.dummy_hash));
    }

    #[test]
    fn cost_is_bounded() {
        assert_eq!(PasswordHasher::new(3).unwrap_err(), PasswordError::InvalidCost(3));
        assert_eq!(PasswordHasher::new(32).unwrap_err(), PasswordError::InvalidCost(32));
        assert_eq!(PasswordHasher::with_default_cost().unwrap().cost(), DEFAULT_COST);
    }

    #[test]
    fn password_validation() {
        assert!(validate_password("secret123").is_ok());
        assert!(matches!(validate_password(""), Err(DomainError::Validation(_))));
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_BYTES)).is_ok());
        assert!(validate_password(&"x".repeat(MAX_PASSWORD_BYTES + 1)).is_err());
    }
}
