//! Paper entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::University;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: i32,

    pub university_id: i32,

    pub title: String,

    pub subject: String,

    pub year: i32,

    pub semester: Option<String>,

    pub exam_type: String,

    /// Name of the stored file on disk
    pub file_name: String,

    pub file_path: String,

    pub file_size: u64,

    pub mime_type: String,

    /// Set once by the store on creation
    pub uploaded_at: DateTime<Utc>,
}

/// Input for creating a paper; already validated by the caller
#[derive(Clone, Debug)]
pub struct NewPaper {
    pub university_id: i32,
    pub title: String,
    pub subject: String,
    pub year: i32,
    pub semester: Option<String>,
    pub exam_type: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
}

/// Paper joined with its owning university
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperWithUniversity {
    #[serde(flatten)]
    pub paper: Paper,

    pub university: University,
}

/// Multi-criterion paper filter.
///
/// Criteria are ANDed together; values inside one criterion are ORed. A
/// criterion that is absent or empty matches every paper.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperFilter {
    #[serde(default)]
    pub university_ids: Option<Vec<i32>>,

    #[serde(default)]
    pub years: Option<Vec<i32>>,

    #[serde(default)]
    pub subjects: Option<Vec<String>>,
}
