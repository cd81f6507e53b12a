//! HS256 bearer token issuing and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use fintrack_core::UserId;

use crate::claims::{TokenClaims, VerificationError, validate_claims};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest lifetime a deployment may configure (100 years).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 100;

/// Failure to mint a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Process-wide HMAC secret.
///
/// Constructed once at startup; changing it invalidates every outstanding token.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtSecret(Vec<u8>);

impl JwtSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

/// Mints signed bearer tokens for a user.
pub trait JwtIssuer: Send + Sync {
    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// Verifies bearer tokens and yields their claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, VerificationError>;
}

/// HS256 issuer + validator sharing one secret.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Option<Duration>,
}

impl Hs256Jwt {
    /// `ttl = None` issues tokens without an `exp` claim.
    pub fn new(secret: &JwtSecret, ttl: Option<Duration>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn with_default_ttl(secret: &JwtSecret) -> Self {
        Self::new(secret, Some(Duration::hours(DEFAULT_TOKEN_TTL_HOURS)))
    }

    fn validation() -> Validation {
        // Time claims are checked by `validate_claims` against an explicit `now`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation
    }
}

impl JwtIssuer for Hs256Jwt {
    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let exp = match self.ttl {
            None => None,
            Some(ttl) => {
                let expires_at = now
                    .checked_add_signed(ttl)
                    .ok_or_else(|| TokenError::Signing("token expiry is out of range".to_string()))?;
                Some(expires_at.timestamp())
            }
        };

        let claims = TokenClaims {
            user_id,
            iat: Some(now.timestamp()),
            exp,
            jti: Some(Uuid::now_v7()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, VerificationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerificationError::Missing);
        }

        let data = decode::<TokenClaims>(token, &self.decoding, &Self::validation()).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected by decoder");
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => VerificationError::BadSignature,
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                _ => VerificationError::Malformed,
            }
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn jwt(secret: &str) -> Hs256Jwt {
        Hs256Jwt::with_default_ttl(&JwtSecret::new(secret).unwrap())
    }

    fn sign_raw(secret: &str, claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(JwtSecret::new(""), Err(TokenError::EmptySecret));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = JwtSecret::new("super-secret").unwrap();
        assert!(!format!("{secret:?}").contains("super-secret"));
    }

    #[test]
    fn issued_token_carries_user_and_time_claims() {
        let jwt = jwt("test-secret");
        let now = Utc::now();
        let token = jwt.issue(UserId::new(7), now).unwrap();

        let claims = jwt.validate(&token, now).unwrap();
        assert_eq!(claims.user_id, UserId::new(7));
        assert_eq!(claims.iat, Some(now.timestamp()));
        assert_eq!(claims.exp, Some((now + Duration::hours(DEFAULT_TOKEN_TTL_HOURS)).timestamp()));
        assert!(claims.jti.is_some());
    }

    #[test]
    fn each_token_gets_a_distinct_jti() {
        let jwt = jwt("test-secret");
        let now = Utc::now();
        let a = jwt.validate(&jwt.issue(UserId::new(1), now).unwrap(), now).unwrap();
        let b = jwt.validate(&jwt.issue(UserId::new(1), now).unwrap(), now).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn token_from_other_secret_has_bad_signature() {
        let now = Utc::now();
        let token = jwt("secret-a").issue(UserId::new(1), now).unwrap();
        assert_eq!(jwt("secret-b").validate(&token, now), Err(VerificationError::BadSignature));
    }

    #[test]
    fn tampered_payload_has_bad_signature() {
        let jwt = jwt("test-secret");
        let now = Utc::now();
        let token = jwt.issue(UserId::new(1), now).unwrap();
        let other = jwt.issue(UserId::new(2), now).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(jwt.validate(&forged, now), Err(VerificationError::BadSignature));
    }

    #[test]
    fn garbage_is_malformed_and_blank_is_missing() {
        let jwt = jwt("test-secret");
        let now = Utc::now();
        assert_eq!(jwt.validate("not-a-jwt", now), Err(VerificationError::Malformed));
        assert_eq!(jwt.validate("a.b.c", now), Err(VerificationError::Malformed));
        assert_eq!(jwt.validate("", now), Err(VerificationError::Missing));
        assert_eq!(jwt.validate("   ", now), Err(VerificationError::Missing));
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = JwtSecret::new("test-secret").unwrap();
        let jwt = Hs256Jwt::new(&secret, Some(Duration::hours(1)));
        let now = Utc::now();
        let token = jwt.issue(UserId::new(1), now - Duration::hours(3)).unwrap();
        assert_eq!(jwt.validate(&token, now), Err(VerificationError::Expired));
    }

    #[test]
    fn no_ttl_issues_non_expiring_tokens() {
        let secret = JwtSecret::new("test-secret").unwrap();
        let jwt = Hs256Jwt::new(&secret, None);
        let issued = Utc::now() - Duration::days(365);
        let token = jwt.issue(UserId::new(3), issued).unwrap();

        let claims = jwt.validate(&token, Utc::now()).unwrap();
        assert_eq!(claims.exp, None);
        assert_eq!(claims.user_id, UserId::new(3));
    }

    #[test]
    fn expiry_overflow_is_a_signing_error() {
        let secret = JwtSecret::new("test-secret").unwrap();
        let jwt = Hs256Jwt::new(&secret, Some(Duration::hours(3_000_000_000)));
        let err = jwt.issue(UserId::new(1), Utc::now()).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn longest_configurable_ttl_still_issues() {
        let secret = JwtSecret::new("test-secret").unwrap();
        let jwt = Hs256Jwt::new(&secret, Some(Duration::hours(MAX_TOKEN_TTL_HOURS)));
        let now = Utc::now();
        let claims = jwt.validate(&jwt.issue(UserId::new(1), now).unwrap(), now).unwrap();
        assert_eq!(claims.exp, Some(now.timestamp() + MAX_TOKEN_TTL_HOURS * 3600));
    }

    #[test]
    fn legacy_token_with_only_user_id_is_accepted() {
        let token = sign_raw("test-secret", json!({ "user_id": 11 }));
        let claims = jwt("test-secret").validate(&token, Utc::now()).unwrap();
        assert_eq!(claims.user_id, UserId::new(11));
        assert_eq!(claims.jti, None);
    }

    #[test]
    fn wrongly_typed_user_id_is_malformed_not_a_panic() {
        let jwt = jwt("test-secret");
        let now = Utc::now();
        for claims in [
            json!({ "user_id": 1.5 }),
            json!({ "user_id": "1" }),
            json!({ "user_id": null }),
            json!({ "sub": "1" }),
        ] {
            let token = sign_raw("test-secret", claims.clone());
            assert_eq!(jwt.validate(&token, now), Err(VerificationError::Malformed), "{claims}");
        }
    }

    #[test]
    fn signature_is_checked_before_claim_shape() {
        // Bad shape *and* wrong key: the signature failure wins.
        let token = sign_raw("other-secret", json!({ "user_id": "not-a-number" }));
        assert_eq!(
            jwt("test-secret").validate(&token, Utc::now()),
            Err(VerificationError::BadSignature)
        );
    }

    #[test]
    fn other_algorithms_are_refused() {
        let token = encode(
            &Header::new(Algorithm::HS512),
            &json!({ "user_id": 1 }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(
            jwt("test-secret").validate(&token, Utc::now()),
            Err(VerificationError::BadSignature)
        );
    }

    proptest! {
        #[test]
        fn issue_then_validate_round_trips_user_id(id in 1i64..=i64::MAX) {
            let jwt = jwt("prop-secret");
            let now = Utc::now();
            let token = jwt.issue(UserId::new(id), now).unwrap();
            prop_assert_eq!(jwt.validate(&token, now).unwrap().user_id, UserId::new(id));
        }
    }
}
