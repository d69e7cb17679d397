//! Product search result rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result column names, in the order the search query selects them.
pub const PRODUCT_COLUMNS: [&str; 6] = [
    "product_name",
    "type_name",
    "category_name",
    "price",
    "image_url",
    "total_stock",
];

/// One product matched by a name search.
///
/// A point-in-time snapshot: rows are never written back. `total_stock` is
/// the sum of stock levels across every inventory location the caller's
/// identity can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMatch {
    /// Product display name.
    pub product_name: String,
    /// Product type (e.g., "Interior Paint").
    pub type_name: String,
    /// Category the type belongs to (e.g., "Paint & Finishes").
    pub category_name: String,
    /// Base price, serialized as a decimal string.
    pub price: Decimal,
    /// Product image, if one has been generated.
    pub image_url: Option<String>,
    /// Stock summed across inventory locations.
    pub total_stock: i64,
}
