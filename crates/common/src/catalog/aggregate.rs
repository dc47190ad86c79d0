//! Derived per-university statistics

use chrono::{DateTime, Duration, Utc};

use crate::models::{CatalogStats, Paper, University, UniversityWithStats};

/// Year range label for a university without papers
pub const NO_PAPERS: &str = "No papers";

/// Number of distinct subjects sampled per university
pub const RECENT_SUBJECT_LIMIT: usize = 3;

/// Window for the catalog-wide recent upload count
pub const RECENT_UPLOAD_WINDOW_DAYS: i64 = 7;

/// Compute the statistics view of one university.
///
/// `papers` may hold the whole catalog; only papers owned by `university`
/// are considered, in the order given.
pub fn university_stats(
    university: &University,
    papers: &[Paper],
    now: DateTime<Utc>,
) -> UniversityWithStats {
    let owned: Vec<&Paper> = papers
        .iter()
        .filter(|p| p.university_id == university.id)
        .collect();

    UniversityWithStats {
        university: university.clone(),
        paper_count: owned.len(),
        latest_upload: latest_upload(&owned, now),
        year_range: year_range(&owned),
        recent_subjects: recent_subjects(&owned),
    }
}

/// `"{min}-{max}"` over paper years, `"No papers"` when empty
pub fn year_range(papers: &[&Paper]) -> String {
    let min = papers.iter().map(|p| p.year).min();
    let max = papers.iter().map(|p| p.year).max();

    match (min, max) {
        (Some(min), Some(max)) => format!("{}-{}", min, max),
        _ => NO_PAPERS.to_string(),
    }
}

/// First distinct subjects in first-seen order
pub fn recent_subjects(papers: &[&Paper]) -> Vec<String> {
    let mut subjects: Vec<String> = Vec::with_capacity(RECENT_SUBJECT_LIMIT);

    for paper in papers {
        if subjects.len() == RECENT_SUBJECT_LIMIT {
            break;
        }
        if !subjects.iter().any(|s| s == &paper.subject) {
            subjects.push(paper.subject.clone());
        }
    }

    subjects
}

/// Recency label of the newest upload
pub fn latest_upload(papers: &[&Paper], now: DateTime<Utc>) -> Option<String> {
    papers
        .iter()
        .map(|p| p.uploaded_at)
        .max()
        .map(|uploaded_at| recency_label((now - uploaded_at).num_days()))
}

/// Map a whole-day age to a display label.
///
/// Buckets always round down: 13 days is one week, 59 days is one month.
/// Negative ages (clock skew) count as today.
pub fn recency_label(days: i64) -> String {
    match days {
        d if d <= 0 => "Today".to_string(),
        1 => "1 day ago".to_string(),
        d if d < 7 => format!("{} days ago", d),
        d if d < 30 => plural(d / 7, "week"),
        d => plural(d / 30, "month"),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count > 1 {
        format!("{} {}s ago", count, unit)
    } else {
        format!("{} {} ago", count, unit)
    }
}

/// Catalog-wide totals
pub fn catalog_stats(
    total_universities: usize,
    papers: &[Paper],
    now: DateTime<Utc>,
) -> CatalogStats {
    let cutoff = now - Duration::days(RECENT_UPLOAD_WINDOW_DAYS);

    CatalogStats {
        total_universities,
        total_papers: papers.len(),
        recent_uploads: papers.iter().filter(|p| p.uploaded_at > cutoff).count(),
    }
}
