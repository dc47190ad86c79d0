//! Router harness shared by handler tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use pyqhub_common::{
    config::{AppConfig, StorageConfig},
    models::{NewPaper, Paper},
};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{create_router, AppState};

/// Seeded catalog with its upload root in a temporary directory
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_storage(|_| {})
    }

    pub fn with_storage(configure: impl FnOnce(&mut StorageConfig)) -> Self {
        Self::with_config(|config| configure(&mut config.storage))
    }

    pub fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let mut config = AppConfig::default();
        config.storage.upload_dir = dir.path().join("uploads");
        config.storage.staging_dir = Some(dir.path().join("staging"));
        config.rate_limit.enabled = false;
        config.observability.metrics_port = 0;
        configure(&mut config);

        let state = AppState::new(config);
        let router = create_router(state.clone());

        Self { router, state, dir }
    }

    pub fn upload_root(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn staging_root(&self) -> PathBuf {
        self.dir.path().join("staging")
    }

    /// Record a paper directly in the store; no file is written
    pub async fn add_paper(&self, university_id: i32, title: &str, subject: &str, year: i32) -> Paper {
        let file_name = format!("papers-0-{}.pdf", title.replace(' ', "-"));

        self.state
            .store
            .create_paper(NewPaper {
                university_id,
                title: title.to_string(),
                subject: subject.to_string(),
                year,
                semester: Some("5".to_string()),
                exam_type: "End Semester".to_string(),
                file_path: self.upload_root().join(&file_name).to_string_lossy().into_owned(),
                file_name,
                file_size: 1024,
                mime_type: "application/pdf".to_string(),
            })
            .await
            .unwrap()
    }
}

pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send_raw(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

/// Status and parsed JSON body (`Null` when the body is empty)
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send_raw(router, request).await;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}
