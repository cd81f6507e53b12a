//! `fintrack-auth`: password hashing and bearer-token lifecycle.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! hash and verify passwords and how to mint and check HS256 tokens, nothing else.

pub mod claims;
pub mod password;
pub mod token;

pub use claims::{TokenClaims, VerificationError, validate_claims};
pub use password::{PasswordError, PasswordHasher, validate_password};
pub use token::{Hs256Jwt, JwtIssuer, JwtSecret, JwtValidator, TokenError};
