//! Product search service.
//!
//! [`ProductSearchService::search`] is the typed operation. It returns
//! `Result` so callers in Rust can match on the failure category.
//! [`ProductSearchService::get_products_by_name`] is the tool-facing boundary:
//! it matches on that `Result` and always produces one JSON envelope.

use tracing::{debug, instrument, warn};

use zava_core::{ProductMatch, ResultEnvelope, SearchRequest};

use crate::db::{self, Checkout, PoolManager};
use crate::error::SalesError;

/// Prefix on every error envelope message.
const FAILURE_PREFIX: &str = "PostgreSQL query failed";

/// Searches the catalog on behalf of identity-scoped callers.
///
/// Share one instance (for example behind an `Arc`) between concurrent
/// callers; each search checks out its own connection.
#[derive(Debug)]
pub struct ProductSearchService {
    pool: PoolManager,
}

impl ProductSearchService {
    /// Create a service over a pool manager. The pool is not opened.
    #[must_use]
    pub const fn new(pool: PoolManager) -> Self {
        Self { pool }
    }

    /// The underlying pool manager.
    #[must_use]
    pub const fn pool(&self) -> &PoolManager {
        &self.pool
    }

    /// Open the connection pool. A no-op if already open.
    ///
    /// # Errors
    ///
    /// Returns `SalesError::ConnectionSetup` if the pool cannot be created.
    pub async fn create_pool(&self) -> Result<(), SalesError> {
        self.pool.create_pool().await
    }

    /// Close the connection pool. A no-op if not open.
    pub async fn close_pool(&self) {
        self.pool.close().await;
    }

    /// Search products by name or description.
    ///
    /// Checks out a connection, binds `request.identity` on it, runs the
    /// query, and returns the connection on every path. Identity binding and
    /// the query together are bounded by the command timeout.
    ///
    /// # Errors
    ///
    /// Returns the `SalesError` for whichever step failed: acquire, identity
    /// binding, query, or the command timeout. Never retries.
    #[instrument(
        skip(self, request),
        fields(max_rows = %request.max_rows, manager = request.identity.is_manager())
    )]
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<ProductMatch>, SalesError> {
        let mut checkout = self.pool.acquire().await?;

        let result = self.search_on(&mut checkout, request).await;
        if result.as_ref().is_err_and(SalesError::poisons_connection) {
            checkout.mark_broken();
        }

        self.pool.release(checkout);
        result
    }

    /// Bind then query on one checked-out connection, nothing in between.
    async fn search_on(
        &self,
        checkout: &mut Checkout,
        request: &SearchRequest,
    ) -> Result<Vec<ProductMatch>, SalesError> {
        let timeout = self.pool.config().command_timeout;
        let conn = checkout.connection();

        let bound_query = async {
            db::bind_identity(&mut *conn, &request.identity).await?;
            db::search_products(&mut *conn, request).await
        };

        tokio::time::timeout(timeout, bound_query)
            .await
            .map_err(|_| SalesError::CommandTimeout { timeout })?
    }

    /// Search and render the outcome as an envelope. Never fails.
    pub async fn search_envelope(&self, request: &SearchRequest) -> ResultEnvelope {
        match self.search(request).await {
            Ok(rows) => {
                debug!(row_count = rows.len(), "Product search succeeded");
                ResultEnvelope::from_rows(rows)
            }
            Err(e) => {
                warn!(category = e.category(), error = %e, "Product search failed");
                ResultEnvelope::failure(format!("{FAILURE_PREFIX}: {e}"))
            }
        }
    }

    /// Search products by name and return the JSON envelope as text.
    ///
    /// `max_rows` is clamped into `1..=100`. An empty `rls_user_id` is the
    /// unrestricted manager identity. Every failure, including a pool that was
    /// never created, is returned as an error envelope.
    pub async fn get_products_by_name(
        &self,
        product_name: &str,
        max_rows: i64,
        rls_user_id: &str,
    ) -> String {
        let request = SearchRequest::new(product_name, max_rows, rls_user_id);
        self.search_envelope(&request).await.to_json()
    }
}
