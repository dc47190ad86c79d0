//! Catalog statistics handler

use axum::{extract::State, Json};

use crate::AppState;
use pyqhub_common::{errors::Result, models::CatalogStats};

/// Totals across the whole catalog
pub async fn catalog_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>> {
    Ok(Json(state.store.catalog_stats().await?))
}
