//! University entity and its derived views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct University {
    pub id: i32,

    /// Unique display name
    pub name: String,

    pub location: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a university
#[derive(Clone, Debug)]
pub struct NewUniversity {
    pub name: String,
    pub location: String,
}

/// University plus statistics derived from its papers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityWithStats {
    #[serde(flatten)]
    pub university: University,

    pub paper_count: usize,

    /// Recency label of the newest upload, `None` without papers
    pub latest_upload: Option<String>,

    /// `"{min}-{max}"` or `"No papers"`
    pub year_range: String,

    /// First three distinct subjects in upload order
    pub recent_subjects: Vec<String>,
}

/// Catalog-wide totals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_universities: usize,
    pub total_papers: usize,
    /// Papers uploaded within the last seven days
    pub recent_uploads: usize,
}
