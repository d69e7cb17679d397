//! Catalog product search.
//!
//! A runtime query rather than `query_as!`: the catalog schema belongs to
//! another system and is not available when this crate is compiled.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{debug, instrument};

use zava_core::{ProductMatch, SearchRequest};

use crate::error::SalesError;

/// Name/description search over the `retail` schema.
///
/// `$1` is an escaped `ILIKE` pattern, `$2` the row limit. Stock is summed
/// over the inventory rows the session identity can see. Grouping includes
/// `product_id` so two products sharing a name stay separate, and it breaks
/// ties in the ordering.
const SEARCH_PRODUCTS_SQL: &str = r"
    SELECT p.product_name,
           pt.type_name,
           c.category_name,
           p.base_price::numeric AS price,
           pe.image_url,
           SUM(i.stock_level)::bigint AS total_stock
    FROM retail.products p
    JOIN retail.product_types pt ON p.type_id = pt.type_id
    JOIN retail.categories c ON p.category_id = c.category_id
    JOIN retail.inventory i ON p.product_id = i.product_id
    JOIN retail.product_embeddings pe ON p.product_id = pe.product_id
    WHERE p.product_name ILIKE $1 OR p.product_description ILIKE $1
    GROUP BY p.product_id, p.product_name, pt.type_name, c.category_name,
             p.base_price, pe.image_url
    ORDER BY p.product_name ASC, p.product_id ASC
    LIMIT $2
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for the product search query.
#[derive(Debug, sqlx::FromRow)]
struct ProductMatchRow {
    product_name: String,
    type_name: String,
    category_name: String,
    price: Decimal,
    image_url: Option<String>,
    total_stock: Option<i64>,
}

impl From<ProductMatchRow> for ProductMatch {
    fn from(row: ProductMatchRow) -> Self {
        Self {
            product_name: row.product_name,
            type_name: row.type_name,
            category_name: row.category_name,
            price: row.price,
            image_url: row.image_url,
            total_stock: row.total_stock.unwrap_or(0),
        }
    }
}

/// Run the product search on an already identity-bound connection.
///
/// Returns at most `request.max_rows` rows ordered by product name.
///
/// # Errors
///
/// Returns `SalesError::QueryExecution` if the store rejects or fails the
/// query, including when the server-side statement timeout fires.
#[instrument(skip_all, fields(max_rows = %request.max_rows))]
pub async fn search_products(
    conn: &mut PgConnection,
    request: &SearchRequest,
) -> Result<Vec<ProductMatch>, SalesError> {
    let rows = sqlx::query_as::<_, ProductMatchRow>(SEARCH_PRODUCTS_SQL)
        .bind(request.name_pattern())
        .bind(request.max_rows.get())
        .fetch_all(conn)
        .await
        .map_err(SalesError::QueryExecution)?;

    debug!(row_count = rows.len(), "Product search returned rows");

    Ok(rows.into_iter().map(ProductMatch::from).collect())
}
