//! Volatile in-memory catalog store

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CatalogStore, SAMPLE_UNIVERSITIES};
use crate::catalog::{aggregate, query};
use crate::errors::{AppError, Result};
use crate::models::*;

/// Monotonic id allocator, seeded at 1, never reuses a value
#[derive(Debug)]
struct IdCounter(i32);

impl Default for IdCounter {
    fn default() -> Self {
        Self(1)
    }
}

impl IdCounter {
    fn next(&mut self) -> i32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// Keyed collections; ids grow monotonically so map order is insertion order
#[derive(Debug, Default)]
struct Collections {
    accounts: BTreeMap<i32, Account>,
    universities: BTreeMap<i32, University>,
    papers: BTreeMap<i32, Paper>,
    next_account_id: IdCounter,
    next_university_id: IdCounter,
    next_paper_id: IdCounter,
}

impl Collections {
    fn insert_university(&mut self, input: NewUniversity) -> Result<University> {
        if self.universities.values().any(|u| u.name == input.name) {
            return Err(AppError::DuplicateUniversity { name: input.name });
        }

        let university = University {
            id: self.next_university_id.next(),
            name: input.name,
            location: input.location,
            created_at: Utc::now(),
        };
        self.universities.insert(university.id, university.clone());

        Ok(university)
    }

    fn joined_papers(&self) -> Result<Vec<PaperWithUniversity>> {
        query::join_universities(self.papers.values(), &self.universities)
    }

    fn paper_snapshot(&self) -> Vec<Paper> {
        self.papers.values().cloned().collect()
    }
}

/// In-memory implementation of [`CatalogStore`].
///
/// A single lock makes uniqueness and ownership checks atomic with the
/// insert they guard. Nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the sample universities (ids 1 to 4)
    pub fn with_sample_data() -> Self {
        let mut collections = Collections::default();

        for (name, location) in SAMPLE_UNIVERSITIES {
            // Names in the seed set are distinct
            if let Err(e) = collections.insert_university(NewUniversity {
                name: name.to_string(),
                location: location.to_string(),
            }) {
                tracing::warn!(error = %e, "Skipping sample university");
            }
        }

        info!(universities = collections.universities.len(), "Seeded sample universities");

        Self {
            inner: RwLock::new(collections),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    // ========================================================================
    // Accounts
    // ========================================================================

    async fn create_account(&self, input: NewAccount) -> Result<Account> {
        let mut inner = self.inner.write().await;

        if inner.accounts.values().any(|a| a.username == input.username) {
            return Err(AppError::DuplicateAccount { username: input.username });
        }

        let account = Account {
            id: inner.next_account_id.next(),
            username: input.username,
            credential_hash: hash_credential(&input.secret),
        };
        inner.accounts.insert(account.id, account.clone());

        debug!(account_id = account.id, "Account created");
        Ok(account)
    }

    async fn account_by_id(&self, id: i32) -> Result<Option<Account>> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().find(|a| a.username == username).cloned())
    }

    // ========================================================================
    // Universities
    // ========================================================================

    async fn create_university(&self, input: NewUniversity) -> Result<University> {
        let university = self.inner.write().await.insert_university(input)?;

        info!(
            university_id = university.id,
            name = %university.name,
            "University created"
        );
        Ok(university)
    }

    async fn university_by_id(&self, id: i32) -> Result<Option<University>> {
        Ok(self.inner.read().await.universities.get(&id).cloned())
    }

    async fn university_by_name(&self, name: &str) -> Result<Option<University>> {
        let inner = self.inner.read().await;
        Ok(inner.universities.values().find(|u| u.name == name).cloned())
    }

    async fn universities(&self) -> Result<Vec<University>> {
        Ok(self.inner.read().await.universities.values().cloned().collect())
    }

    async fn universities_with_stats(&self) -> Result<Vec<UniversityWithStats>> {
        let inner = self.inner.read().await;
        let papers = inner.paper_snapshot();
        let now = Utc::now();

        Ok(inner
            .universities
            .values()
            .map(|university| aggregate::university_stats(university, &papers, now))
            .collect())
    }

    // ========================================================================
    // Papers
    // ========================================================================

    async fn create_paper(&self, input: NewPaper) -> Result<Paper> {
        let mut inner = self.inner.write().await;

        if !inner.universities.contains_key(&input.university_id) {
            return Err(AppError::UniversityNotFound { id: input.university_id });
        }

        let paper = Paper {
            id: inner.next_paper_id.next(),
            university_id: input.university_id,
            title: input.title,
            subject: input.subject,
            year: input.year,
            semester: input.semester,
            exam_type: input.exam_type,
            file_name: input.file_name,
            file_path: input.file_path,
            file_size: input.file_size,
            mime_type: input.mime_type,
            uploaded_at: Utc::now(),
        };
        inner.papers.insert(paper.id, paper.clone());

        Ok(paper)
    }

    async fn paper_by_id(&self, id: i32) -> Result<Option<Paper>> {
        Ok(self.inner.read().await.papers.get(&id).cloned())
    }

    async fn papers_by_university(&self, university_id: i32) -> Result<Vec<Paper>> {
        let inner = self.inner.read().await;
        Ok(inner
            .papers
            .values()
            .filter(|p| p.university_id == university_id)
            .cloned()
            .collect())
    }

    async fn papers(&self) -> Result<Vec<PaperWithUniversity>> {
        self.inner.read().await.joined_papers()
    }

    async fn search_papers(&self, query: &str) -> Result<Vec<PaperWithUniversity>> {
        let joined = self.inner.read().await.joined_papers()?;
        Ok(query::search(joined, query))
    }

    async fn filter_papers(&self, filter: &PaperFilter) -> Result<Vec<PaperWithUniversity>> {
        let joined = self.inner.read().await.joined_papers()?;
        Ok(filter.apply(joined))
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    async fn catalog_stats(&self) -> Result<CatalogStats> {
        let inner = self.inner.read().await;
        let papers = inner.paper_snapshot();

        Ok(aggregate::catalog_stats(inner.universities.len(), &papers, Utc::now()))
    }
}
