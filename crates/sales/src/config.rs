//! Connection pool configuration.
//!
//! The library never reads the process environment on its own: a
//! [`PoolManager`](crate::db::PoolManager) is always built from an explicit
//! [`SalesConfig`]. [`SalesConfig::from_env`] is a separate constructor for
//! binaries that want environment-driven setup.
//!
//! # Environment Variables
//!
//! ## Required
//! - `POSTGRES_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ZAVA_POOL_MIN_SIZE` - Minimum pooled connections (default: 1)
//! - `ZAVA_POOL_MAX_SIZE` - Maximum pooled connections (default: 3)
//! - `ZAVA_COMMAND_TIMEOUT_SECS` - Client-side command timeout (default: 30)
//! - `ZAVA_STATEMENT_TIMEOUT_SECS` - Server-side statement timeout (default: 30)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MIN_SIZE: u32 = 1;
const DEFAULT_MAX_SIZE: u32 = 3;
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors that can occur during loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid pool configuration: {0}")]
    InvalidPool(String),
}

/// Sizing, timeouts, and session tuning for the connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Connections opened eagerly and kept alive.
    pub min_size: u32,
    /// Upper bound on concurrent connections (and so on concurrent searches).
    pub max_size: u32,
    /// Per-command client timeout.
    ///
    /// Applied separately to waiting for a connection and to each
    /// bind-then-query sequence, so one search can take up to twice this
    /// long before it fails.
    pub command_timeout: Duration,
    /// Server-side `statement_timeout` applied to every pooled session.
    pub statement_timeout: Duration,
    /// Extra server settings applied when each connection is opened.
    pub session_settings: Vec<(String, String)>,
}

impl PoolConfig {
    /// The reference profile: a deliberately small pool that protects the
    /// backing store.
    ///
    /// | Field               | Value                         |
    /// |---------------------|-------------------------------|
    /// | `min_size`          | 1                             |
    /// | `max_size`          | 3                             |
    /// | `command_timeout`   | 30 s                          |
    /// | `statement_timeout` | 30 s                          |
    /// | `session_settings`  | `jit=off`, `work_mem=4MB`     |
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            session_settings: vec![
                ("jit".to_string(), "off".to_string()),
                ("work_mem".to_string(), "4MB".to_string()),
            ],
        }
    }

    /// Same profile with a different pool size.
    #[must_use]
    pub fn with_size(mut self, min_size: u32, max_size: u32) -> Self {
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }

    /// Check sizing and timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPool` if `max_size` is zero, `min_size`
    /// exceeds `max_size`, or either timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::InvalidPool(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(ConfigError::InvalidPool(format!(
                "min_size ({}) must not exceed max_size ({})",
                self.min_size, self.max_size
            )));
        }
        if self.command_timeout.is_zero() {
            return Err(ConfigError::InvalidPool(
                "command_timeout must be greater than zero".to_string(),
            ));
        }
        if self.statement_timeout.is_zero() {
            return Err(ConfigError::InvalidPool(
                "statement_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// All server settings for a new session, including `statement_timeout`.
    #[must_use]
    pub fn server_settings(&self) -> Vec<(String, String)> {
        let mut settings = self.session_settings.clone();
        settings.retain(|(key, _)| key != "statement_timeout");
        settings.push((
            "statement_timeout".to_string(),
            format!("{}ms", self.statement_timeout.as_millis()),
        ));
        settings
    }
}

/// Everything needed to open the pool: where to connect and how.
///
/// Implements `Debug` manually to redact the connection string, which
/// carries credentials.
#[derive(Clone)]
pub struct SalesConfig {
    /// `PostgreSQL` connection URL (host, credentials, port, database)
    pub database_url: SecretString,
    /// Pool sizing, timeouts, and session tuning
    pub pool: PoolConfig,
}

impl std::fmt::Debug for SalesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesConfig")
            .field("database_url", &"[REDACTED]")
            .field("pool", &self.pool)
            .finish()
    }
}

impl SalesConfig {
    /// Create a configuration from explicit values.
    #[must_use]
    pub const fn new(database_url: SecretString, pool: PoolConfig) -> Self {
        Self { database_url, pool }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present. Unset
    /// pool variables fall back to [`PoolConfig::conservative`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the connection string is missing or a pool
    /// variable is malformed or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("POSTGRES_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("POSTGRES_URL".to_string()))?;

        let defaults = PoolConfig::conservative();
        let pool = PoolConfig {
            min_size: parse_or(&lookup, "ZAVA_POOL_MIN_SIZE", defaults.min_size)?,
            max_size: parse_or(&lookup, "ZAVA_POOL_MAX_SIZE", defaults.max_size)?,
            command_timeout: Duration::from_secs(parse_or(
                &lookup,
                "ZAVA_COMMAND_TIMEOUT_SECS",
                defaults.command_timeout.as_secs(),
            )?),
            statement_timeout: Duration::from_secs(parse_or(
                &lookup,
                "ZAVA_STATEMENT_TIMEOUT_SECS",
                defaults.statement_timeout.as_secs(),
            )?),
            session_settings: defaults.session_settings,
        };

        pool.validate()
            .map_err(|e| ConfigError::InvalidEnvVar("ZAVA_POOL_*".to_string(), e.to_string()))?;

        Ok(Self { database_url, pool })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, using `default` when it is unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
