//! Search and filter over papers joined with their university

use std::collections::BTreeMap;

use crate::errors::{AppError, Result};
use crate::models::{Paper, PaperFilter, PaperWithUniversity, University};

/// Attach the owning university to every paper.
///
/// Papers are created only against existing universities and nothing is
/// ever deleted, so an unresolved id means the store is corrupt.
pub fn join_universities<'a>(
    papers: impl IntoIterator<Item = &'a Paper>,
    universities: &BTreeMap<i32, University>,
) -> Result<Vec<PaperWithUniversity>> {
    papers
        .into_iter()
        .map(|paper| {
            let university = universities.get(&paper.university_id).ok_or_else(|| {
                tracing::error!(
                    paper_id = paper.id,
                    university_id = paper.university_id,
                    "Paper references a missing university"
                );
                AppError::Internal {
                    message: format!(
                        "paper {} references missing university {}",
                        paper.id, paper.university_id
                    ),
                }
            })?;

            Ok(PaperWithUniversity {
                paper: paper.clone(),
                university: university.clone(),
            })
        })
        .collect()
}

/// Case-insensitive substring match on title, subject, year and university name
pub fn matches_query(entry: &PaperWithUniversity, needle: &str) -> bool {
    let paper = &entry.paper;

    paper.title.to_lowercase().contains(needle)
        || paper.subject.to_lowercase().contains(needle)
        || paper.year.to_string().contains(needle)
        || entry.university.name.to_lowercase().contains(needle)
}

/// Keep the entries matching `query`
pub fn search(entries: Vec<PaperWithUniversity>, query: &str) -> Vec<PaperWithUniversity> {
    let needle = query.to_lowercase();

    entries
        .into_iter()
        .filter(|entry| matches_query(entry, &needle))
        .collect()
}

impl PaperFilter {
    /// True when no criterion constrains the result
    pub fn is_empty(&self) -> bool {
        is_unconstrained(&self.university_ids)
            && is_unconstrained(&self.years)
            && is_unconstrained(&self.subjects)
    }

    /// Whether `paper` satisfies every present criterion
    pub fn matches(&self, paper: &Paper) -> bool {
        admits(&self.university_ids, &paper.university_id)
            && admits(&self.years, &paper.year)
            && admits(&self.subjects, &paper.subject)
    }

    /// Keep the entries matching this filter
    pub fn apply(&self, entries: Vec<PaperWithUniversity>) -> Vec<PaperWithUniversity> {
        if self.is_empty() {
            return entries;
        }

        entries
            .into_iter()
            .filter(|entry| self.matches(&entry.paper))
            .collect()
    }
}

fn is_unconstrained<T>(criterion: &Option<Vec<T>>) -> bool {
    criterion.as_ref().map_or(true, |values| values.is_empty())
}

fn admits<T: PartialEq>(criterion: &Option<Vec<T>>, value: &T) -> bool {
    match criterion {
        Some(values) if !values.is_empty() => values.contains(value),
        _ => true,
    }
}
