//! Database wiring: connection pool and schema bootstrap.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

/// Connection settings for the Postgres pool.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub connect: PgConnectOptions,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(connect: PgConnectOptions) -> Self {
        Self {
            connect,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

// Never print the password.
impl core::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.connect.get_host())
            .field("port", &self.connect.get_port())
            .field("username", &self.connect.get_username())
            .field("database", &self.connect.get_database())
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Open a pool; fails fast if the database is unreachable.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        host = settings.connect.get_host(),
        port = settings.connect.get_port(),
        database = settings.connect.get_database().unwrap_or_default(),
        max_connections = settings.max_connections,
        "connecting to postgres"
    );
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(settings.connect.clone())
        .await
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id          BIGSERIAL PRIMARY KEY,
        user_id     BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        amount      DOUBLE PRECISION NOT NULL CHECK (amount > 0),
        type        TEXT NOT NULL CHECK (type IN ('income', 'expense')),
        category    TEXT,
        description TEXT,
        date        TIMESTAMPTZ NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS transactions_user_id_date_idx ON transactions (user_id, date DESC)",
];

/// Create the tables this service needs if they are missing. Idempotent.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA.iter().copied() {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("database schema ensured");
    Ok(())
}
