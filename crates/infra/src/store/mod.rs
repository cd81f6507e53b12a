//! Storage boundary for users and their transactions.
//!
//! Handlers only ever see the traits; the concrete backend (in-memory for
//! dev/tests, Postgres for deployments) is chosen once at startup and injected.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryTransactionStore, InMemoryUserStore};
pub use postgres::{PostgresTransactionStore, PostgresUserStore};
pub use r#trait::{NewUser, StoreError, TransactionStore, UserRecord, UserStore};
