//! Failure taxonomy for pool setup and product search.
//!
//! [`SalesError::ConnectionSetup`] is returned to whoever calls
//! `create_pool`. Every other variant arises during a search and is rendered
//! into an error envelope by the search service instead of being returned to
//! the tool-calling layer.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while setting up the pool or running a search.
#[derive(Debug, Error)]
pub enum SalesError {
    /// The pool could not be created: store unreachable, credentials
    /// rejected, session tuning rejected, or invalid pool configuration.
    #[error("failed to create connection pool: {0}")]
    ConnectionSetup(#[source] sqlx::Error),

    /// An operation needed the pool before `create_pool` succeeded, or after
    /// `close`.
    #[error("no database connection pool available; call create_pool() first")]
    PoolNotInitialized,

    /// No connection became available before the command timeout.
    #[error("connection pool exhausted or unavailable: {0}")]
    PoolExhausted(#[source] sqlx::Error),

    /// The store rejected the session identity configuration.
    #[error("failed to bind row-level security identity: {0}")]
    IdentityBind(#[source] sqlx::Error),

    /// The store rejected or failed the search query.
    #[error("product search query failed: {0}")]
    QueryExecution(#[source] sqlx::Error),

    /// Identity binding plus query did not finish within the command timeout.
    #[error("command timed out after {timeout:?}")]
    CommandTimeout {
        /// The configured command timeout.
        timeout: Duration,
    },
}

impl SalesError {
    /// Stable label for the failure category, used as a log field.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::ConnectionSetup(_) => "connection_setup",
            Self::PoolNotInitialized => "pool_not_initialized",
            Self::PoolExhausted(_) => "pool_exhausted",
            Self::IdentityBind(_) => "identity_bind",
            Self::QueryExecution(_) => "query_execution",
            Self::CommandTimeout { .. } => "command_timeout",
        }
    }

    /// Whether the connection this failure happened on can no longer be
    /// trusted and must be discarded instead of returned to the pool.
    ///
    /// A timed-out command abandons a statement mid-flight, so the session
    /// state is unknown.
    #[must_use]
    pub const fn poisons_connection(&self) -> bool {
        match self {
            Self::IdentityBind(e) | Self::QueryExecution(e) => is_connection_fault(e),
            Self::CommandTimeout { .. } => true,
            Self::ConnectionSetup(_) | Self::PoolNotInitialized | Self::PoolExhausted(_) => false,
        }
    }
}

/// Errors that mean the underlying connection itself is broken.
const fn is_connection_fault(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) | sqlx::Error::WorkerCrashed
    )
}
