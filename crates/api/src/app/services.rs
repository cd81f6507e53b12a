use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;

use fintrack_auth::{Hs256Jwt, JwtIssuer, PasswordHasher, validate_password};
use fintrack_core::Email;
use fintrack_infra::db;
use fintrack_infra::store::{
    InMemoryTransactionStore, InMemoryUserStore, NewUser, PostgresTransactionStore, PostgresUserStore, StoreError,
    TransactionStore, UserRecord, UserStore,
};

use crate::app::errors::ApiError;
use crate::config::{AppConfig, StorageConfig};

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Everything a handler needs, built once at startup and shared via `Arc`.
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pub hasher: Arc<PasswordHasher>,
    pub jwt: Arc<Hs256Jwt>,
}

impl AppServices {
    pub fn new(
        users: Arc<dyn UserStore>,
        transactions: Arc<dyn TransactionStore>,
        hasher: PasswordHasher,
        jwt: Hs256Jwt,
    ) -> Self {
        Self {
            users,
            transactions,
            hasher: Arc::new(hasher),
            jwt: Arc::new(jwt),
        }
    }

    pub fn in_memory(hasher: PasswordHasher, jwt: Hs256Jwt) -> Self {
        Self::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryTransactionStore::new()),
            hasher,
            jwt,
        )
    }

    /// Validate, hash off the reactor, insert.
    pub async fn register(&self, email: &str, password: &str) -> Result<UserRecord, ApiError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let hasher = self.hasher.clone();
        let plaintext = password.to_owned();
        let password_hash = blocking(move || hasher.hash(&plaintext))
            .await?
            .map_err(ApiError::internal)?;

        let user = self
            .users
            .create(NewUser { email, password_hash })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ApiError::Conflict("email already registered".to_string()),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials and mint a token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller,
    /// in both body and bcrypt work.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ApiError::validation("email and password are required"));
        }
        let email = Email::parse(email)?;

        let record = self.users.find_by_email(&email).await?;

        let hasher = self.hasher.clone();
        let candidate = password.to_owned();
        let stored = record.as_ref().map(|u| u.password_hash.clone());
        let verified = blocking(move || match stored {
            Some(hash) => hasher.verify(&hash, &candidate),
            None => hasher.verify_dummy(&candidate),
        })
        .await?;

        let Some(user) = record.filter(|_| verified) else {
            tracing::warn!(email = %email, "login failed");
            return Err(ApiError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        let token = self.jwt.issue(user.id, Utc::now()).map_err(ApiError::internal)?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(token)
    }
}

/// Run CPU-bound work (bcrypt) on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("blocking task failed: {e}")))
}

/// Wire stores, hasher and token service from configuration.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let hasher = PasswordHasher::new(config.bcrypt_cost).context("invalid bcrypt cost")?;
    let jwt = Hs256Jwt::new(&config.jwt_secret, config.token_ttl);

    match &config.storage {
        StorageConfig::InMemory => {
            tracing::warn!("using in-memory stores; data is lost on restart");
            Ok(AppServices::in_memory(hasher, jwt))
        }
        StorageConfig::Postgres(settings) => {
            let pool = db::connect(settings).await.context("failed to connect to postgres")?;
            db::ensure_schema(&pool).await.context("failed to create database schema")?;
            tracing::info!("using postgres stores");
            Ok(AppServices::new(
                Arc::new(PostgresUserStore::new(pool.clone())),
                Arc::new(PostgresTransactionStore::new(pool)),
                hasher,
                jwt,
            ))
        }
    }
}
