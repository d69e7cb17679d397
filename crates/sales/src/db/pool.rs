//! Connection pool manager.
//!
//! Wraps a sqlx `PgPool` with an explicit lifecycle: `create_pool` and
//! `close` are idempotent, and `acquire` fails fast with
//! [`SalesError::PoolNotInitialized`] whenever no pool is open.

use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgConnection, PgPool, Postgres};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::{PoolConfig, SalesConfig};
use crate::error::SalesError;

/// Owns the single connection pool for one service instance.
pub struct PoolManager {
    database_url: SecretString,
    config: PoolConfig,
    pool: RwLock<Option<PgPool>>,
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("database_url", &"[REDACTED]")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PoolManager {
    /// Create a manager. No connection is opened until [`Self::create_pool`].
    #[must_use]
    pub fn new(config: SalesConfig) -> Self {
        Self {
            database_url: config.database_url,
            config: config.pool,
            pool: RwLock::new(None),
        }
    }

    /// The pool configuration this manager opens connections with.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Open the pool. A no-op if it is already open.
    ///
    /// Opens `min_size` connections eagerly with the configured session
    /// settings, so an unreachable store or rejected tuning fails here.
    ///
    /// # Errors
    ///
    /// Returns `SalesError::ConnectionSetup` if the configuration is invalid,
    /// the store is unreachable, or it rejects the session settings.
    #[instrument(skip(self), fields(min_size = self.config.min_size, max_size = self.config.max_size))]
    pub async fn create_pool(&self) -> Result<(), SalesError> {
        let mut slot = self.pool.write().await;
        if slot.is_some() {
            debug!("Connection pool already initialized");
            return Ok(());
        }

        self.config
            .validate()
            .map_err(|e| SalesError::ConnectionSetup(sqlx::Error::Configuration(Box::new(e))))?;

        let connect_options = PgConnectOptions::from_str(self.database_url.expose_secret())
            .map_err(SalesError::ConnectionSetup)?
            .options(self.config.server_settings());

        let pool = PgPoolOptions::new()
            .min_connections(self.config.min_size)
            .max_connections(self.config.max_size)
            .acquire_timeout(self.config.command_timeout)
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create PostgreSQL pool");
                SalesError::ConnectionSetup(e)
            })?;

        *slot = Some(pool);
        info!("PostgreSQL connection pool created");
        Ok(())
    }

    /// Check out a connection for exclusive use.
    ///
    /// Waits up to the command timeout for a free connection.
    ///
    /// # Errors
    ///
    /// Returns `SalesError::PoolNotInitialized` before `create_pool` or after
    /// `close`, and `SalesError::PoolExhausted` if no connection becomes
    /// available in time.
    pub async fn acquire(&self) -> Result<Checkout, SalesError> {
        let pool = self
            .pool
            .read()
            .await
            .clone()
            .ok_or(SalesError::PoolNotInitialized)?;

        match pool.acquire().await {
            Ok(conn) => Ok(Checkout::new(conn)),
            Err(sqlx::Error::PoolClosed) => Err(SalesError::PoolNotInitialized),
            Err(e) => {
                warn!(error = %e, "Failed to acquire connection from pool");
                Err(SalesError::PoolExhausted(e))
            }
        }
    }

    /// Return a checked-out connection to the pool.
    ///
    /// A checkout marked broken is closed instead, and the pool opens a
    /// replacement on demand. Releasing after `close` just closes the
    /// connection.
    pub fn release(&self, checkout: Checkout) {
        if checkout.is_broken() {
            debug!("Discarding broken connection");
        }
        drop(checkout);
    }

    /// Close every pooled connection and forget the pool. A no-op if no pool
    /// is open.
    ///
    /// Waits for checked-out connections to be returned.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        let pool = self.pool.write().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            info!("PostgreSQL connection pool closed");
        }
    }

    /// Returns `true` while a pool is open.
    pub async fn is_initialized(&self) -> bool {
        self.pool.read().await.is_some()
    }

    /// Connection counts, or `None` if no pool is open.
    pub async fn status(&self) -> Option<PoolStatus> {
        let guard = self.pool.read().await;
        let pool = guard.as_ref()?;
        Some(PoolStatus {
            max_size: self.config.max_size,
            size: pool.size(),
            idle: u32::try_from(pool.num_idle()).unwrap_or(u32::MAX),
        })
    }
}

/// Point-in-time connection counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Configured upper bound.
    pub max_size: u32,
    /// Connections currently open (idle or checked out).
    pub size: u32,
    /// Open connections not checked out.
    pub idle: u32,
}

impl PoolStatus {
    /// Connections checked out right now.
    #[must_use]
    pub const fn in_use(&self) -> u32 {
        self.size.saturating_sub(self.idle)
    }

    /// Connections a new caller could obtain without waiting, counting ones
    /// the pool has not opened yet.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.max_size.saturating_sub(self.in_use())
    }
}

/// A connection checked out from the pool.
///
/// Dropping the checkout returns the connection on every path, including
/// early returns and unwinding.
#[derive(Debug)]
pub struct Checkout {
    conn: PoolConnection<Postgres>,
    broken: bool,
}

impl Checkout {
    const fn new(conn: PoolConnection<Postgres>) -> Self {
        Self { conn, broken: false }
    }

    /// The underlying connection.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Mark the connection as unusable so it is closed rather than reused.
    pub fn mark_broken(&mut self) {
        if !self.broken {
            self.broken = true;
            self.conn.close_on_drop();
        }
    }

    /// Returns `true` once [`Self::mark_broken`] has been called.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }
}

/// Verify the store is reachable with the given configuration.
///
/// Opens a throwaway single-connection pool, checks out one connection,
/// returns it, and closes the pool.
///
/// # Errors
///
/// Returns `SalesError::ConnectionSetup` if the pool cannot be opened, or
/// `SalesError::PoolExhausted` if the connection cannot be checked out.
#[instrument(skip(config))]
pub async fn check_connection(config: &SalesConfig) -> Result<(), SalesError> {
    let probe = SalesConfig::new(
        config.database_url.clone(),
        config.pool.clone().with_size(1, 1),
    );
    let manager = PoolManager::new(probe);

    manager.create_pool().await?;
    let result = manager.acquire().await.map(|checkout| manager.release(checkout));
    manager.close().await;

    if result.is_ok() {
        info!("PostgreSQL connection check succeeded");
    }
    result
}
