use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PORT: u16 = 5432;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required when DATABASE_URL is not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("invalid database url: {0}")]
    Url(#[source] sqlx::Error),
}

/// Where the contacts table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Url(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        database: String,
    },
}

/// Connection settings for the contacts database, built once at startup.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub target: DatabaseTarget,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Build the config from an arbitrary key lookup (environment plus any
    /// command line overrides).
    ///
    /// `DATABASE_URL` wins over the individual `DB_*` parts.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let target = match non_empty("DATABASE_URL") {
            Some(url) => DatabaseTarget::Url(url),
            None => DatabaseTarget::Parts {
                host: non_empty("DB_HOST").ok_or(ConfigError::Missing("DB_HOST"))?,
                port: parse_or("DB_PORT", non_empty("DB_PORT"), DEFAULT_PORT)?,
                user: non_empty("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?,
                password: lookup("DB_PASSWORD"),
                database: non_empty("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?,
            },
        };

        let max_connections = parse_or("DB_POOL_MAX", non_empty("DB_POOL_MAX"), DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_POOL_MAX",
                value: "0".into(),
            });
        }

        let acquire_timeout_secs = parse_or(
            "DB_ACQUIRE_TIMEOUT_SECS",
            non_empty("DB_ACQUIRE_TIMEOUT_SECS"),
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Ok(Self {
            target,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match &self.target {
            DatabaseTarget::Url(url) => url.parse().map_err(ConfigError::Url),
            DatabaseTarget::Parts {
                host,
                port,
                user,
                password,
                database,
            } => {
                let options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .database(database);
                Ok(match password {
                    Some(password) => options.password(password),
                    None => options,
                })
            }
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
