//! University handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::validation_error;
use crate::AppState;
use pyqhub_common::{
    errors::{AppError, Result},
    models::{NewUniversity, Paper, University, UniversityWithStats},
};

/// Request to create a new university
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUniversityRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(length(min = 1, max = 200))]
    pub location: String,
}

impl CreateUniversityRequest {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            location: self.location.trim().to_string(),
        }
    }
}

/// List every university with its paper statistics
pub async fn list_universities(
    State(state): State<AppState>,
) -> Result<Json<Vec<UniversityWithStats>>> {
    Ok(Json(state.store.universities_with_stats().await?))
}

/// Get a university by ID
pub async fn get_university(
    State(state): State<AppState>,
    Path(university_id): Path<i32>,
) -> Result<Json<University>> {
    let university = state
        .store
        .university_by_id(university_id)
        .await?
        .ok_or(AppError::UniversityNotFound { id: university_id })?;

    Ok(Json(university))
}

/// Create a university; names must be unique
pub async fn create_university(
    State(state): State<AppState>,
    Json(request): Json<CreateUniversityRequest>,
) -> Result<(StatusCode, Json<University>)> {
    let request = request.trimmed();
    request.validate().map_err(validation_error)?;

    let university = state
        .store
        .create_university(NewUniversity {
            name: request.name,
            location: request.location,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(university)))
}

/// Papers owned by a university; unknown ids yield an empty list
pub async fn list_university_papers(
    State(state): State<AppState>,
    Path(university_id): Path<i32>,
) -> Result<Json<Vec<Paper>>> {
    Ok(Json(state.store.papers_by_university(university_id).await?))
}
