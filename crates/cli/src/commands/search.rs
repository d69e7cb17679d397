//! Product search command.
//!
//! # Usage
//!
//! ```bash
//! zava-cli search --name paint --max-rows 10
//! zava-cli search --name drill --user 2f6c9a1e-store-7
//! ```
//!
//! Prints the result envelope to stdout. A search that fails after the pool
//! is open still prints an error envelope and exits 0; only setup failures
//! exit non-zero.

use zava_sales::{PoolManager, ProductSearchService, SalesConfig};

use super::CommandError;

/// Run one search and print its envelope.
///
/// # Errors
///
/// Returns `CommandError` if configuration is missing or the pool cannot be
/// created.
pub async fn run(name: &str, max_rows: i64, user: &str) -> Result<(), CommandError> {
    let config = SalesConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    let service = ProductSearchService::new(PoolManager::new(config));
    service.create_pool().await?;

    let envelope = service.get_products_by_name(name, max_rows, user).await;
    service.close_pool().await;

    #[allow(clippy::print_stdout)]
    {
        println!("{envelope}");
    }
    Ok(())
}
