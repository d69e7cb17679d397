//! Core types for Zava product search.
//!
//! This module provides type-safe wrappers for the search domain.

pub mod envelope;
pub mod identity;
pub mod product;
pub mod search;

pub use envelope::{NO_RESULTS_MESSAGE, ResultEnvelope};
pub use identity::RlsUserId;
pub use product::{PRODUCT_COLUMNS, ProductMatch};
pub use search::{MaxRows, SearchRequest};
