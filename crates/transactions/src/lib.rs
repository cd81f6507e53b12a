//! Income/expense transactions domain module.
//!
//! Pure domain rules (validation, balance folding); no IO, no HTTP, no storage.

pub mod balance;
pub mod transaction;

pub use balance::Balance;
pub use transaction::{Transaction, TransactionDraft, TransactionKind};
