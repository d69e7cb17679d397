//! Zava Sales - pooled, identity-scoped product search.
//!
//! This crate exposes one capability to an agent/tool-calling layer:
//! search the retail catalog by product name and description, and return a
//! bounded, structured result set.
//!
//! # Security
//!
//! Every search binds the caller's row-level security identity on the
//! connection it runs on, immediately before the query. Identities are never
//! cached against pooled connections.
//!
//! # Modules
//!
//! - [`config`] - Explicit pool and connection configuration
//! - [`db`] - Connection pool manager, session identity binding, catalog query
//! - [`error`] - Failure taxonomy for setup and search
//! - [`service`] - Product search service rendering result envelopes
//! - [`tools`] - Tool descriptor and executor for the agent layer

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod tools;

pub use config::{ConfigError, PoolConfig, SalesConfig};
pub use db::{Checkout, PoolManager, PoolStatus, check_connection};
pub use error::SalesError;
pub use service::ProductSearchService;
pub use tools::{Tool, ToolExecutor};
