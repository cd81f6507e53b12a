//! Process configuration, read once from the environment at startup.

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

use fintrack_auth::JwtSecret;
use fintrack_auth::password::{MAX_COST, MIN_COST};
use fintrack_auth::token::{DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};
use fintrack_infra::db::DatabaseSettings;

pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000);
pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            reason: reason.to_string(),
        }
    }
}

/// Where users and transactions live.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(DatabaseSettings),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: JwtSecret,
    /// `None` issues tokens without `exp`.
    pub token_ttl: Option<chrono::Duration>,
    pub bcrypt_cost: u32,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a
    /// map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = match lookup("JWT_SECRET") {
            None => return Err(ConfigError::Missing("JWT_SECRET")),
            Some(secret) => JwtSecret::new(secret).map_err(|e| ConfigError::invalid("JWT_SECRET", e))?,
        };

        let ttl_hours: i64 = parse_or(get("JWT_TTL_HOURS"), "JWT_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        let token_ttl = match ttl_hours {
            0 => None,
            h if (1..=MAX_TOKEN_TTL_HOURS).contains(&h) => chrono::Duration::try_hours(h),
            _ => {
                return Err(ConfigError::invalid(
                    "JWT_TTL_HOURS",
                    format!("must be between 0 and {MAX_TOKEN_TTL_HOURS}"),
                ));
            }
        };

        let bcrypt_cost: u32 = parse_or(get("BCRYPT_COST"), "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(MIN_COST..=MAX_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::invalid(
                "BCRYPT_COST",
                format!("must be between {MIN_COST} and {MAX_COST}"),
            ));
        }

        let bind_addr: SocketAddr = parse_or(get("BIND_ADDR"), "BIND_ADDR", DEFAULT_BIND_ADDR)?;

        let persistent = parse_bool(get("USE_PERSISTENT_STORES"), "USE_PERSISTENT_STORES")?;
        let storage = if persistent {
            StorageConfig::Postgres(database_settings(&get)?)
        } else {
            StorageConfig::InMemory
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            bcrypt_cost,
            storage,
        })
    }
}

/// `DATABASE_URL` wins; otherwise the `DB_*` parts are assembled.
fn database_settings(get: &impl Fn(&str) -> Option<String>) -> Result<DatabaseSettings, ConfigError> {
    let connect = match get("DATABASE_URL") {
        Some(url) => PgConnectOptions::from_str(&url).map_err(|e| ConfigError::invalid("DATABASE_URL", e))?,
        None => {
            let host = get("DB_HOST").unwrap_or_else(|| "localhost".to_string());
            let port: u16 = parse_or(get("DB_PORT"), "DB_PORT", DEFAULT_DB_PORT)?;
            let user = get("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
            let name = get("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;

            let mut options = PgConnectOptions::new()
                .host(&host)
                .port(port)
                .username(&user)
                .database(&name);
            if let Some(password) = get("DB_PASSWORD") {
                options = options.password(&password);
            }
            options
        }
    };

    let mut settings = DatabaseSettings::new(connect);
    settings.max_connections = parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
    if settings.max_connections == 0 {
        return Err(ConfigError::invalid("DB_MAX_CONNECTIONS", "must be at least 1"));
    }
    Ok(settings)
}

fn parse_or<T>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e| ConfigError::invalid(key, e)),
    }
}

fn parse_bool(raw: Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::invalid(key, format!("expected true/false, got {v:?}"))),
        },
    }
}
