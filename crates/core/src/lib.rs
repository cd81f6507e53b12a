//! `fintrack-core`: shared domain primitives (ids, errors, value objects).
//!
//! This crate contains **pure domain** code (no infrastructure concerns).

pub mod email;
pub mod error;
pub mod id;

pub use email::Email;
pub use error::{DomainError, DomainResult};
pub use id::{TransactionId, UserId};
