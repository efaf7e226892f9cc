//! Connection configuration
//!
//! Database settings are read from environment variables with defaults,
//! then validated before a pool is created.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration loading and validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

impl ConfigError {
    fn validation_failed(field: &str, reason: &str) -> Self {
        ConfigError::ValidationFailed {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Connection pool sizing and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: Option<u64>,
    pub max_lifetime_seconds: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),  // 10 minutes
            max_lifetime_seconds: Some(1800), // 30 minutes
        }
    }
}

impl PoolConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            max_connections: parse_env(
                "DB_MAX_CONNECTIONS",
                "max_connections",
                defaults.max_connections,
                "positive integer",
            )?,
            min_connections: parse_env(
                "DB_MIN_CONNECTIONS",
                "min_connections",
                defaults.min_connections,
                "non-negative integer",
            )?,
            acquire_timeout_seconds: parse_env(
                "DB_ACQUIRE_TIMEOUT",
                "acquire_timeout_seconds",
                defaults.acquire_timeout_seconds,
                "valid number of seconds",
            )?,
            idle_timeout_seconds: parse_optional_env(
                "DB_IDLE_TIMEOUT",
                "idle_timeout_seconds",
                defaults.idle_timeout_seconds,
            )?,
            max_lifetime_seconds: parse_optional_env(
                "DB_MAX_LIFETIME",
                "max_lifetime_seconds",
                defaults.max_lifetime_seconds,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::validation_failed(
                "max_connections",
                "must be greater than 0",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation_failed(
                "min_connections",
                "must not exceed max_connections",
            ));
        }

        if self.acquire_timeout_seconds == 0 {
            return Err(ConfigError::validation_failed(
                "acquire_timeout_seconds",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_seconds.map(Duration::from_secs)
    }

    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_seconds.map(Duration::from_secs)
    }
}

/// Postgres connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool: PoolConfig,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: PoolConfig::default(),
        }
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Load from `DATABASE_URL` and the `DB_*` pool variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingEnvVar {
            var: "DATABASE_URL".to_string(),
        })?;

        let config = Self {
            url,
            pool: PoolConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.url).map_err(|_| ConfigError::InvalidValue {
            field: "url".to_string(),
            value: self.url.clone(),
            expected: "valid database URL".to_string(),
        })?;

        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::InvalidValue {
                field: "url".to_string(),
                value: parsed.scheme().to_string(),
                expected: "postgres or postgresql scheme".to_string(),
            });
        }

        self.pool.validate()
    }
}

/// Where a registry keeps its rows
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionConfig {
    /// In-process tables
    Memory,
    Postgres(DatabaseConfig),
}

impl ConnectionConfig {
    /// Postgres when `DATABASE_URL` is set, otherwise in-memory
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("DATABASE_URL") {
            Ok(_) => Ok(ConnectionConfig::Postgres(DatabaseConfig::from_env()?)),
            Err(_) => Ok(ConnectionConfig::Memory),
        }
    }
}

fn parse_env<T: std::str::FromStr>(
    key: &str,
    field: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw,
            expected: expected.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_optional_env(key: &str, field: &str, default: Option<u64>) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() || raw.trim() == "none" => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: field.to_string(),
                value: raw,
                expected: "valid number of seconds or 'none'".to_string(),
            }),
        Err(_) => Ok(default),
    }
}
