//! Catalog engines
//!
//! - `aggregate`: per-university statistics and catalog totals
//! - `query`: free-text search, multi-criterion filter and university joins
//!
//! Everything here is a pure function of a store snapshot; nothing is cached.

pub mod aggregate;
pub mod query;

pub use aggregate::{catalog_stats, recency_label, university_stats};
pub use query::{join_universities, search};
