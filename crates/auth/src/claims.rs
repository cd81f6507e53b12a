use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use fintrack_core::UserId;

/// Tolerated clock skew when checking `iat`/`exp`, in seconds.
pub const CLOCK_SKEW_LEEWAY_SECS: i64 = 60;

/// Claims carried by a fintrack bearer token.
///
/// Only `user_id` is mandatory. `iat`, `exp` and `jti` are always written by
/// [`crate::Hs256Jwt`] but tokens minted without them (no-expiry deployments)
/// still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identifier of the authenticated user. Must be a JSON integer.
    pub user_id: UserId,

    /// Issued-at (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiration (unix seconds). Absent means the token never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Unique token id, reserved for revocation lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
}

/// Why a presented bearer token was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("missing bearer token")]
    Missing,

    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    BadSignature,

    #[error("token has expired")]
    Expired,
}

/// Deterministically validate decoded claims against `now`.
///
/// Signature verification happens before this is called; see
/// [`crate::JwtValidator`].
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), VerificationError> {
    if claims.user_id.get() <= 0 {
        return Err(VerificationError::Malformed);
    }

    let now = now.timestamp();

    if let Some(iat) = claims.iat {
        if iat > now + CLOCK_SKEW_LEEWAY_SECS {
            return Err(VerificationError::Malformed);
        }
        if let Some(exp) = claims.exp {
            if exp <= iat {
                return Err(VerificationError::Malformed);
            }
        }
    }

    if let Some(exp) = claims.exp {
        if now >= exp + CLOCK_SKEW_LEEWAY_SECS {
            return Err(VerificationError::Expired);
        }
    }

    Ok(())
}
