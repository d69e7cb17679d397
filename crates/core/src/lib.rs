//! Zava Core - Shared domain types for product search.
//!
//! This crate provides the types shared by every Zava component:
//! - `sales` - Pooled, identity-scoped product search service
//! - `cli` - Command-line entry point for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure transformations - no I/O, no
//! database access. The result envelope rendering lives here because it must
//! be usable on every return path without touching a connection.
//!
//! # Modules
//!
//! - [`types`] - Search requests, row-level security identities, product rows,
//!   and the uniform result envelope

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
