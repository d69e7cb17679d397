//! Database connectivity check.
//!
//! # Environment Variables
//!
//! - `POSTGRES_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use zava_sales::{SalesConfig, check_connection};

use super::CommandError;

/// Open one connection with the configured settings and close it.
///
/// # Errors
///
/// Returns `CommandError` if configuration is missing or the store cannot be
/// reached.
pub async fn run() -> Result<(), CommandError> {
    let config = SalesConfig::from_env()?;

    tracing::info!("Checking PostgreSQL connectivity...");
    check_connection(&config).await?;
    tracing::info!("PostgreSQL connection OK");
    Ok(())
}
