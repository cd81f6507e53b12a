//! Postgres-backed credential and transaction stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Email already registered |
//! | Database (other) | Any other | `Backend` | FK/check violations, other database errors |
//! | PoolClosed / Io / other | N/A | `Backend` | Connection failures |
//!
//! ## Ownership
//!
//! Every transaction query binds `user_id` in its `WHERE` clause, so a row owned
//! by another user is indistinguishable from a missing row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use fintrack_core::{Email, TransactionId, UserId};
use fintrack_transactions::{Balance, Transaction, TransactionDraft, TransactionKind};

use super::r#trait::{NewUser, StoreError, TransactionStore, UserRecord, UserStore};

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip_all, fields(email = %user.email), err)]
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash
            "#,
        )
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("email already registered".to_string())
            } else {
                map_sqlx_error("create_user", e)
            }
        })?;

        UserRow::from_row(&row)
            .map(UserRecord::from)
            .map_err(|e| map_sqlx_error("create_user", e))
    }

    #[instrument(skip_all, err)]
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT id, email, password_hash FROM users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.map(|r| UserRow::from_row(&r).map(UserRecord::from))
            .transpose()
            .map_err(|e| map_sqlx_error("find_user_by_email", e))
    }
}

#[derive(Debug, Clone)]
pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TRANSACTION_COLUMNS: &str = "id, user_id, amount, type, category, description, date, created_at";

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    #[instrument(skip(self), fields(user_id = %owner), err)]
    async fn list(&self, owner: UserId) -> Result<Vec<Transaction>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = $1 ORDER BY date DESC, id DESC"
        ))
        .bind(owner.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_transactions", e))?;

        rows.iter().map(decode_transaction).collect()
    }

    #[instrument(skip(self), fields(user_id = %owner, transaction_id = %id), err)]
    async fn get(&self, owner: UserId, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 AND user_id = $2"
        ))
        .bind(id.get())
        .bind(owner.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_transaction", e))?;

        row.as_ref().map(decode_transaction).transpose()
    }

    #[instrument(skip(self, draft), fields(user_id = %owner), err)]
    async fn create(&self, owner: UserId, draft: TransactionDraft) -> Result<Transaction, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO transactions (user_id, amount, type, category, description, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(owner.get())
        .bind(draft.amount)
        .bind(draft.kind.as_str())
        .bind(draft.category)
        .bind(draft.description)
        .bind(draft.date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_transaction", e))?;

        decode_transaction(&row)
    }

    #[instrument(skip(self, draft), fields(user_id = %owner, transaction_id = %id), err)]
    async fn update(
        &self,
        owner: UserId,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE transactions
            SET amount = $3, type = $4, category = $5, description = $6, date = $7
            WHERE id = $1 AND user_id = $2
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(owner.get())
        .bind(draft.amount)
        .bind(draft.kind.as_str())
        .bind(draft.category)
        .bind(draft.description)
        .bind(draft.date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_transaction", e))?;

        match row {
            Some(row) => decode_transaction(&row),
            None => Err(StoreError::NotFound),
        }
    }

    #[instrument(skip(self), fields(user_id = %owner, transaction_id = %id), err)]
    async fn delete(&self, owner: UserId, id: TransactionId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id.get())
            .bind(owner.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_transaction", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %owner), err)]
    async fn balance(&self, owner: UserId) -> Result<Balance, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE type = 'income'), 0)::float8 AS income,
                COALESCE(SUM(amount) FILTER (WHERE type = 'expense'), 0)::float8 AS expense
            FROM transactions
            WHERE user_id = $1
            "#,
        )
        .bind(owner.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("balance", e))?;

        let income: f64 = row.try_get("income").map_err(|e| map_sqlx_error("balance", e))?;
        let expense: f64 = row.try_get("expense").map_err(|e| map_sqlx_error("balance", e))?;
        Ok(Balance::from_totals(income, expense))
    }
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            StoreError::Backend(format!(
                "database error in {operation} (code {code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        sqlx::Error::PoolTimedOut => StoreError::Backend(format!("connection pool timed out in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: UserId::new(row.id),
            email: Email::from_trusted(row.email),
            password_hash: row.password_hash,
        }
    }
}

#[derive(Debug)]
struct TransactionRow {
    id: i64,
    user_id: i64,
    amount: f64,
    kind: String,
    category: Option<String>,
    description: Option<String>,
    date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TransactionRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TransactionRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            amount: row.try_get("amount")?,
            kind: row.try_get("type")?,
            category: row.try_get("category")?,
            description: row.try_get("description")?,
            date: row.try_get("date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let kind: TransactionKind = row
            .kind
            .parse()
            .map_err(|_| StoreError::Backend(format!("unknown transaction type in row {}: {}", row.id, row.kind)))?;

        Ok(Transaction {
            id: TransactionId::new(row.id),
            user_id: UserId::new(row.user_id),
            amount: row.amount,
            kind,
            category: row.category,
            description: row.description,
            date: row.date,
            created_at: row.created_at,
        })
    }
}

fn decode_transaction(row: &sqlx::postgres::PgRow) -> Result<Transaction, StoreError> {
    TransactionRow::from_row(row)
        .map_err(|e| map_sqlx_error("decode_transaction", e))?
        .try_into()
}

/// Runs only when `TEST_DATABASE_URL` points at a disposable database.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use sqlx::postgres::PgPoolOptions;

    async fn pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new().max_connections(2).connect(&url).await.ok()?;
        ensure_schema(&pool).await.ok()?;
        Some(pool)
    }

    fn unique_email() -> Email {
        Email::parse(&format!("pg-{}@example.com", Utc::now().timestamp_nanos_opt().unwrap_or_default())).unwrap()
    }

    #[tokio::test]
    async fn postgres_round_trip_and_isolation() {
        let Some(pool) = pool().await else {
            return;
        };
        let users = PostgresUserStore::new(pool.clone());
        let txs = PostgresTransactionStore::new(pool);

        let email = unique_email();
        let alice = users
            .create(NewUser { email: email.clone(), password_hash: "h".into() })
            .await
            .unwrap();
        let dup = users.create(NewUser { email: email.clone(), password_hash: "h".into() }).await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));

        let bob = users
            .create(NewUser { email: unique_email(), password_hash: "h".into() })
            .await
            .unwrap();

        let draft = TransactionDraft {
            amount: 12.5,
            kind: TransactionKind::Expense,
            category: Some("food".into()),
            description: None,
            date: Utc::now(),
        };
        let created = txs.create(alice.id, draft.clone()).await.unwrap();
        assert_eq!(created.user_id, alice.id);

        assert!(txs.get(bob.id, created.id).await.unwrap().is_none());
        assert_eq!(txs.delete(bob.id, created.id).await, Err(StoreError::NotFound));
        assert!(txs.list(bob.id).await.unwrap().is_empty());

        let balance = txs.balance(alice.id).await.unwrap();
        assert_eq!(balance.expense, 12.5);
        assert_eq!(balance.balance, -12.5);

        txs.delete(alice.id, created.id).await.unwrap();
        assert!(txs.list(alice.id).await.unwrap().is_empty());
    }
}
