//! Paper catalog handlers

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::AppState;
use pyqhub_common::{
    errors::{AppError, Result},
    metrics,
    models::{Paper, PaperFilter, PaperWithUniversity},
};

/// Query string of the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// List every paper with its university
pub async fn list_papers(State(state): State<AppState>) -> Result<Json<Vec<PaperWithUniversity>>> {
    Ok(Json(state.store.papers().await?))
}

/// Get a paper by ID
pub async fn get_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<i32>,
) -> Result<Json<Paper>> {
    let paper = state
        .store
        .paper_by_id(paper_id)
        .await?
        .ok_or(AppError::PaperNotFound { id: paper_id })?;

    Ok(Json(paper))
}

/// Free-text search over title, subject, year and university name
pub async fn search_papers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PaperWithUniversity>>> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::Validation {
            message: "Search query is required".to_string(),
            field: Some("q".to_string()),
        })?;

    let results = state.store.search_papers(&query).await?;

    metrics::record_search(results.len());
    tracing::info!(query = %query, results = results.len(), "Search completed");

    Ok(Json(results))
}

/// Filter papers by university ids, years and subjects
pub async fn filter_papers(
    State(state): State<AppState>,
    Json(filter): Json<PaperFilter>,
) -> Result<Json<Vec<PaperWithUniversity>>> {
    let results = state.store.filter_papers(&filter).await?;

    metrics::record_filter(results.len());
    tracing::debug!(?filter, results = results.len(), "Filter completed");

    Ok(Json(results))
}

/// Stream the stored file of a paper as an attachment
pub async fn download_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<i32>,
) -> Result<Response> {
    let paper = state
        .store
        .paper_by_id(paper_id)
        .await?
        .ok_or(AppError::PaperNotFound { id: paper_id })?;

    let file = match tokio::fs::File::open(&paper.file_path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(paper_id, path = %paper.file_path, "Stored file missing on disk");
            return Err(AppError::NotFound {
                resource_type: "file".to_string(),
                id: paper.file_name,
            });
        }
        Err(e) => return Err(e.into()),
    };
    let length = file.metadata().await?.len();

    metrics::record_download();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &paper.mime_type)
        .header(header::CONTENT_LENGTH, length.to_string())
        .header(header::CONTENT_DISPOSITION, attachment_disposition(&paper.file_name))
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal {
            message: format!("Failed to build response: {}", e),
        })
}

/// `Content-Disposition: attachment` with a header-safe file name
fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .filter(|c| !matches!(c, '"' | ';' | '\\'))
        .collect();
    let safe = if safe.trim().is_empty() { "download".to_string() } else { safe };

    format!("attachment; filename=\"{}\"", safe)
}
