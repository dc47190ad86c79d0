//! PYQ Hub Common Library
//!
//! Shared code for the PYQ Hub services including:
//! - Catalog models and the entity store
//! - Aggregation and query engines
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod catalog;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use store::{CatalogStore, InMemoryStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
