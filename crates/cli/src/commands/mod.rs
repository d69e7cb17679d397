//! CLI command implementations.

pub mod check;
pub mod search;

use thiserror::Error;
use zava_sales::{ConfigError, SalesError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded from the environment.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The database could not be reached or the pool could not be opened.
    #[error("Database error: {0}")]
    Sales(#[from] SalesError),
}
