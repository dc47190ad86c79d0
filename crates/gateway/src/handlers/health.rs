//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::time::Instant;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub catalog: CheckResult,
    pub uploads: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn from_outcome<T, E: std::fmt::Display>(outcome: Result<T, E>, start: Instant) -> Self {
        match outcome {
            Ok(_) => CheckResult {
                status: "up".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => CheckResult {
                status: "down".to_string(),
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: pyqhub_common::VERSION.to_string(),
    })
}

/// Readiness probe - catalog reachable and upload directory writable
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let start = Instant::now();
    let catalog = CheckResult::from_outcome(state.store.catalog_stats().await, start);

    let start = Instant::now();
    let uploads = CheckResult::from_outcome(state.uploads.check_writable().await, start);

    let all_healthy = catalog.is_up() && uploads.is_up();

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks { catalog, uploads },
    })
}
