//! Database operations for the retail catalog `PostgreSQL`.
//!
//! # Database: `zava`, schema `retail`
//!
//! Read-only access; the schema, its row-level security policies, and the
//! embedding pipeline that fills `product_embeddings` are managed elsewhere.
//!
//! ## Tables
//!
//! - `products` - Name, description, base price, type and category references
//! - `product_types` - Product type names
//! - `categories` - Category names
//! - `inventory` - Stock level per product per store (row-level security)
//! - `product_embeddings` - Generated image URLs and embeddings per product
//!
//! # Connection Lifecycle
//!
//! [`PoolManager`] owns at most one pool. Each search checks out a
//! [`Checkout`], binds the caller identity on it ([`session`]), runs the
//! catalog query ([`products`]), and returns the connection.

pub mod pool;
pub mod products;
pub mod session;

pub use pool::{Checkout, PoolManager, PoolStatus, check_connection};
pub use products::search_products;
pub use session::{bind_identity, current_identity};
