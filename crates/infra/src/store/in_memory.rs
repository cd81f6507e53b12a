use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use fintrack_core::{Email, TransactionId, UserId};
use fintrack_transactions::{Balance, Transaction, TransactionDraft};

use super::r#trait::{NewUser, StoreError, TransactionStore, UserRecord, UserStore};

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
struct UserTable {
    last_id: i64,
    rows: HashMap<UserId, UserRecord>,
}

/// In-memory credential store.
///
/// Intended for tests/dev. Email uniqueness is checked under the write lock.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;

        if table.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email already registered".to_string()));
        }

        table.last_id += 1;
        let record = UserRecord {
            id: UserId::new(table.last_id),
            email: user.email,
            password_hash: user.password_hash,
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.values().find(|u| &u.email == email).cloned())
    }
}

#[derive(Debug, Default)]
struct TransactionTable {
    last_id: i64,
    rows: HashMap<TransactionId, Transaction>,
}

/// In-memory transaction store. Every lookup is keyed by `(owner, id)`.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    inner: RwLock<TransactionTable>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn list(&self, owner: UserId) -> Result<Vec<Transaction>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        let mut items: Vec<Transaction> = table
            .rows
            .values()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn get(&self, owner: UserId, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).filter(|t| t.user_id == owner).cloned())
    }

    async fn create(&self, owner: UserId, draft: TransactionDraft) -> Result<Transaction, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        table.last_id += 1;

        let tx = Transaction {
            id: TransactionId::new(table.last_id),
            user_id: owner,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            description: draft.description,
            date: draft.date,
            created_at: Utc::now(),
        };
        table.rows.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn update(
        &self,
        owner: UserId,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let tx = table
            .rows
            .get_mut(&id)
            .filter(|t| t.user_id == owner)
            .ok_or(StoreError::NotFound)?;

        tx.amount = draft.amount;
        tx.kind = draft.kind;
        tx.category = draft.category;
        tx.description = draft.description;
        tx.date = draft.date;
        Ok(tx.clone())
    }

    async fn delete(&self, owner: UserId, id: TransactionId) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let owned = table.rows.get(&id).is_some_and(|t| t.user_id == owner);
        if !owned {
            return Err(StoreError::NotFound);
        }
        table.rows.remove(&id);
        Ok(())
    }

    async fn balance(&self, owner: UserId) -> Result<Balance, StoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(Balance::from_transactions(
            table.rows.values().filter(|t| t.user_id == owner),
        ))
    }
}
