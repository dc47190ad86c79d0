//! Entity store for PYQ Hub
//!
//! Provides:
//! - The `CatalogStore` trait consumed by the gateway
//! - `InMemoryStore`, a volatile implementation with per-kind id counters
//! - The sample university seed set

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::*;

/// Universities created at startup when seeding is enabled
pub const SAMPLE_UNIVERSITIES: &[(&str, &str)] = &[
    ("Delhi University", "New Delhi"),
    ("Mumbai University", "Mumbai"),
    ("Anna University", "Chennai"),
    ("Jawaharlal Nehru University", "New Delhi"),
];

/// Create-and-read access to the paper catalog.
///
/// Lookups report absence as `Ok(None)`; errors are reserved for rejected
/// creates and broken internal invariants.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // ========================================================================
    // Accounts
    // ========================================================================

    async fn create_account(&self, input: NewAccount) -> Result<Account>;

    async fn account_by_id(&self, id: i32) -> Result<Option<Account>>;

    async fn account_by_username(&self, username: &str) -> Result<Option<Account>>;

    // ========================================================================
    // Universities
    // ========================================================================

    /// Fails with `DuplicateUniversity` when the name is taken
    async fn create_university(&self, input: NewUniversity) -> Result<University>;

    async fn university_by_id(&self, id: i32) -> Result<Option<University>>;

    async fn university_by_name(&self, name: &str) -> Result<Option<University>>;

    async fn universities(&self) -> Result<Vec<University>>;

    /// Every university with statistics recomputed from the current papers
    async fn universities_with_stats(&self) -> Result<Vec<UniversityWithStats>>;

    // ========================================================================
    // Papers
    // ========================================================================

    /// Fails with `UniversityNotFound` when the owner does not exist
    async fn create_paper(&self, input: NewPaper) -> Result<Paper>;

    async fn paper_by_id(&self, id: i32) -> Result<Option<Paper>>;

    async fn papers_by_university(&self, university_id: i32) -> Result<Vec<Paper>>;

    async fn papers(&self) -> Result<Vec<PaperWithUniversity>>;

    async fn search_papers(&self, query: &str) -> Result<Vec<PaperWithUniversity>>;

    async fn filter_papers(&self, filter: &PaperFilter) -> Result<Vec<PaperWithUniversity>>;

    // ========================================================================
    // Statistics
    // ========================================================================

    async fn catalog_stats(&self) -> Result<CatalogStats>;
}
