use async_trait::async_trait;
use thiserror::Error;

use fintrack_core::{Email, TransactionId, UserId};
use fintrack_transactions::{Balance, Transaction, TransactionDraft};

/// Storage operation error.
///
/// These are **infrastructure errors**; input validation happens before a
/// store is ever called.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique key already exists (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row does not exist or is not owned by the caller.
    #[error("not found")]
    NotFound,

    /// The backend failed (connection, query, row decoding).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A persisted credential.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
}

impl core::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Credential to insert. The id is assigned by the store.
#[derive(Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
}

/// Credential store.
///
/// `create` must fail with [`StoreError::Conflict`] when the email is taken,
/// including under concurrent registrations of the same address.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError>;
}

/// Per-user transaction store.
///
/// Every method takes the owner explicitly and must never return or touch a
/// row belonging to another user; a foreign row behaves exactly like a missing
/// one.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Owner's transactions, newest effective date first.
    async fn list(&self, owner: UserId) -> Result<Vec<Transaction>, StoreError>;

    async fn get(&self, owner: UserId, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    async fn create(&self, owner: UserId, draft: TransactionDraft) -> Result<Transaction, StoreError>;

    /// Replace every mutable field. [`StoreError::NotFound`] if absent or foreign.
    async fn update(
        &self,
        owner: UserId,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, StoreError>;

    /// [`StoreError::NotFound`] if absent or foreign.
    async fn delete(&self, owner: UserId, id: TransactionId) -> Result<(), StoreError>;

    /// Income/expense totals over the owner's transactions (zero when empty).
    async fn balance(&self, owner: UserId) -> Result<Balance, StoreError>;
}
