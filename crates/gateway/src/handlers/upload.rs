//! Multipart paper upload

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::VecDeque;
use validator::Validate;

use super::validation_error;
use crate::uploads::{title_from_file_name, StagedFile};
use crate::AppState;
use pyqhub_common::{
    errors::{AppError, ErrorCode, Result},
    metrics,
    models::{NewPaper, Paper},
};

const FILES_FIELD: &str = "papers";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub papers: Vec<Paper>,
}

/// Raw text parts as received
#[derive(Debug, Default)]
struct UploadFields {
    university_id: Option<String>,
    subject: Option<String>,
    year: Option<String>,
    semester: Option<String>,
    exam_type: Option<String>,
}

/// Metadata shared by every file of one upload
#[derive(Debug, Validate)]
struct UploadForm {
    university_id: i32,

    #[validate(length(min = 1, max = 200))]
    subject: String,

    year: i32,

    #[validate(length(max = 100))]
    semester: Option<String>,

    #[validate(length(min = 1, max = 100))]
    exam_type: String,
}

impl UploadFields {
    fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "universityId" => &mut self.university_id,
            "subject" => &mut self.subject,
            "year" => &mut self.year,
            "semester" => &mut self.semester,
            "examType" => &mut self.exam_type,
            _ => {
                tracing::debug!(field = name, "Ignoring unknown upload field");
                return;
            }
        };
        *slot = Some(value.trim().to_string());
    }

    fn into_form(self) -> Result<UploadForm> {
        let form = UploadForm {
            university_id: parse_int("universityId", required("universityId", self.university_id)?)?,
            subject: required("subject", self.subject)?,
            year: parse_int("year", required("year", self.year)?)?,
            semester: self.semester.filter(|s| !s.is_empty()),
            exam_type: required("examType", self.exam_type)?,
        };
        form.validate().map_err(validation_error)?;
        Ok(form)
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| AppError::MissingField {
        field: field.to_string(),
    })
}

fn parse_int(field: &str, value: String) -> Result<i32> {
    value.parse().map_err(|_| AppError::InvalidFormat {
        message: format!("{} must be an integer, got {:?}", field, value),
    })
}

/// Label for the rejection counter
fn rejection_reason(error: &AppError) -> &'static str {
    match error.code() {
        ErrorCode::PayloadTooLarge => "too_large",
        ErrorCode::UnsupportedMediaType => "mime_type",
        ErrorCode::UniversityNotFound => "unknown_university",
        ErrorCode::ValidationError | ErrorCode::MissingField | ErrorCode::InvalidFormat => {
            "validation"
        }
        _ => "internal",
    }
}

/// Upload one or more papers sharing the same metadata
pub async fn upload_papers(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut staged = VecDeque::new();
    let outcome = store_upload(&state, &mut multipart, &mut staged).await;

    // Anything still staged was never turned into a paper
    for leftover in staged.drain(..) {
        state.uploads.discard(&leftover.path).await;
    }

    match outcome {
        Ok(papers) => Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: format!("Successfully uploaded {} papers", papers.len()),
                papers,
            }),
        )),
        Err(e) => {
            metrics::record_upload_rejection(rejection_reason(&e));
            Err(e)
        }
    }
}

async fn store_upload(
    state: &AppState,
    multipart: &mut Multipart,
    staged: &mut VecDeque<StagedFile>,
) -> Result<Vec<Paper>> {
    let uploads = &state.uploads;
    let mut fields = UploadFields::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| uploads.multipart_error(e))? {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILES_FIELD {
            if staged.len() >= uploads.max_files() {
                return Err(AppError::Validation {
                    message: format!("At most {} files per upload", uploads.max_files()),
                    field: Some(FILES_FIELD.to_string()),
                });
            }
            staged.push_back(uploads.stage(field).await?);
        } else {
            let value = field.text().await.map_err(|e| uploads.multipart_error(e))?;
            fields.set(&name, value);
        }
    }

    if staged.is_empty() {
        return Err(AppError::Validation {
            message: "No files uploaded".to_string(),
            field: Some(FILES_FIELD.to_string()),
        });
    }

    let form = fields.into_form()?;
    let university = state
        .store
        .university_by_id(form.university_id)
        .await?
        .ok_or(AppError::UniversityNotFound { id: form.university_id })?;

    let mut papers = Vec::with_capacity(staged.len());
    let mut total_bytes = 0;

    while let Some(file) = staged.pop_front() {
        let stored = match uploads.commit(&file, &university.name).await {
            Ok(stored) => stored,
            Err(e) => {
                uploads.discard(&file.path).await;
                return Err(e);
            }
        };

        let created = state
            .store
            .create_paper(NewPaper {
                university_id: university.id,
                title: title_from_file_name(&file.original_name),
                subject: form.subject.clone(),
                year: form.year,
                semester: form.semester.clone(),
                exam_type: form.exam_type.clone(),
                file_name: stored.file_name,
                file_path: stored.path.to_string_lossy().into_owned(),
                file_size: file.size,
                mime_type: file.mime_type,
            })
            .await;

        match created {
            Ok(paper) => {
                tracing::info!(
                    paper_id = paper.id,
                    university_id = university.id,
                    file_name = %paper.file_name,
                    size = paper.file_size,
                    "Paper uploaded"
                );
                total_bytes += paper.file_size;
                papers.push(paper);
            }
            Err(e) => {
                uploads.discard(&stored.path).await;
                return Err(e);
            }
        }
    }

    metrics::record_upload(university.id, papers.len(), total_bytes);
    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{json_request, send, send_raw, TestApp};
    use axum::{
        body::Body,
        http::{header, Method, Request},
    };
    use std::path::{Path, PathBuf};

    const BOUNDARY: &str = "pyqhub-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value)
                            .as_bytes(),
                    );
                }
                Part::File(file_name, content_type, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"papers\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            file_name, content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/papers/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn metadata(university_id: &'static str) -> Vec<Part<'static>> {
        vec![
            Part::Text("universityId", university_id),
            Part::Text("subject", "Mathematics"),
            Part::Text("year", "2021"),
            Part::Text("semester", ""),
            Part::Text("examType", "End Semester"),
        ]
    }

    /// Files left in the upload root or the staging area
    fn leftover_files(app: &TestApp) -> Vec<PathBuf> {
        let mut files = files_under(&app.upload_root());
        files.extend(files_under(&app.staging_root()));
        files
    }

    /// Every regular file below `root`
    fn files_under(root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else { continue };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    found.push(path);
                }
            }
        }
        found
    }

    #[test]
    fn test_fields_into_form() {
        let mut fields = UploadFields::default();
        fields.set("universityId", " 3 ".into());
        fields.set("subject", "Physics".into());
        fields.set("year", "2020".into());
        fields.set("semester", "  ".into());
        fields.set("examType", "Mid Term".into());
        fields.set("unrelated", "ignored".into());

        let form = fields.into_form().unwrap();
        assert_eq!(form.university_id, 3);
        assert_eq!(form.year, 2020);
        assert_eq!(form.semester, None);
        assert_eq!(form.exam_type, "Mid Term");
    }

    #[test]
    fn test_any_integer_year_accepted() {
        let mut fields = UploadFields::default();
        fields.set("universityId", "1".into());
        fields.set("subject", "Physics".into());
        fields.set("year", "1850".into());
        fields.set("examType", "Mid Term".into());

        assert_eq!(fields.into_form().unwrap().year, 1850);
    }

    #[tokio::test]
    async fn test_upload_and_download_round_trip() {
        let app = TestApp::new();
        let mut parts = metadata("3");
        parts.push(Part::File("Maths 2021.pdf", "application/pdf", b"%PDF-1.4 first"));
        parts.push(Part::File("Maths Supplementary.pdf", "application/pdf", b"%PDF-1.4 second"));

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Successfully uploaded 2 papers");

        let first = &body["papers"][0];
        assert_eq!(first["id"], 1);
        assert_eq!(first["universityId"], 3);
        assert_eq!(first["title"], "Maths 2021");
        assert_eq!(first["year"], 2021);
        assert!(first["semester"].is_null());
        assert_eq!(first["fileSize"], 14);
        assert_eq!(first["mimeType"], "application/pdf");
        assert_eq!(body["papers"][1]["title"], "Maths Supplementary");

        let stored = PathBuf::from(first["filePath"].as_str().unwrap());
        assert!(stored.starts_with(app.upload_root().join("Anna University")));
        assert!(first["fileName"].as_str().unwrap().starts_with("papers-"));
        assert_eq!(std::fs::read(&stored).unwrap(), b"%PDF-1.4 first");
        assert!(files_under(&app.staging_root()).is_empty());

        let response = send_raw(
            &app.router,
            json_request(Method::GET, "/api/papers/1/download", None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "14");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"papers-"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 first");

        let (_, stats) = send(&app.router, json_request(Method::GET, "/api/stats", None)).await;
        assert_eq!(stats["totalPapers"], 2);
    }

    #[tokio::test]
    async fn test_missing_field_discards_files() {
        let app = TestApp::new();
        let parts = vec![
            Part::File("paper.pdf", "application/pdf", b"%PDF"),
            Part::Text("universityId", "1"),
            Part::Text("year", "2021"),
            Part::Text("examType", "End Semester"),
        ];

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "MISSING_FIELD");
        assert_eq!(body["error"]["field"], "subject");
        assert!(leftover_files(&app).is_empty());
    }

    #[tokio::test]
    async fn test_non_integer_year() {
        let app = TestApp::new();
        let parts = vec![
            Part::Text("universityId", "1"),
            Part::Text("subject", "Physics"),
            Part::Text("year", "twenty"),
            Part::Text("examType", "End Semester"),
            Part::File("paper.pdf", "application/pdf", b"%PDF"),
        ];

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn test_unknown_university() {
        let app = TestApp::new();
        let mut parts = metadata("99");
        parts.push(Part::File("paper.pdf", "application/pdf", b"%PDF"));

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "UNIVERSITY_NOT_FOUND");
        assert!(leftover_files(&app).is_empty());

        let (_, papers) = send(&app.router, json_request(Method::GET, "/api/papers", None)).await;
        assert_eq!(papers, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_no_files() {
        let app = TestApp::new();

        let (status, body) = send(&app.router, upload_request(&metadata("1"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "papers");
        assert!(body["error"]["message"].as_str().unwrap().contains("No files uploaded"));
    }

    #[tokio::test]
    async fn test_disallowed_mime_type() {
        let app = TestApp::new();
        let mut parts = metadata("1");
        parts.push(Part::File("scan.png", "image/png", b"\x89PNG"));

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_mime_type_guessed_from_name() {
        let app = TestApp::new();
        let mut parts = metadata("1");
        parts.push(Part::File("notes.docx", "application/octet-stream", b"PK"));

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body["papers"][0]["mimeType"],
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[tokio::test]
    async fn test_file_too_large() {
        let app = TestApp::with_storage(|storage| storage.max_file_size_bytes = 8);
        let mut parts = metadata("1");
        parts.push(Part::File("big.pdf", "application/pdf", b"0123456789abcdef"));

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert!(leftover_files(&app).is_empty());
    }

    #[tokio::test]
    async fn test_too_many_files() {
        let app = TestApp::with_storage(|storage| storage.max_files_per_upload = 1);
        let mut parts = metadata("1");
        parts.push(Part::File("a.pdf", "application/pdf", b"%PDF"));
        parts.push(Part::File("b.pdf", "application/pdf", b"%PDF"));

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "papers");
        assert!(leftover_files(&app).is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let app = TestApp::with_storage(|storage| {
            storage.max_file_size_bytes = 8;
            storage.max_files_per_upload = 1;
        });
        let subject = "x".repeat(2 * 1024 * 1024);
        let parts = vec![
            Part::Text("universityId", "1"),
            Part::Text("subject", &subject),
            Part::Text("year", "2021"),
            Part::Text("examType", "End Semester"),
            Part::File("paper.pdf", "application/pdf", b"%PDF"),
        ];

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert!(leftover_files(&app).is_empty());
    }

    #[tokio::test]
    async fn test_committed_file_served_and_staging_is_not() {
        let app = TestApp::new();
        let mut parts = metadata("3");
        parts.push(Part::File("Maths 2021.pdf", "application/pdf", b"%PDF-1.4 served"));

        let (status, body) = send(&app.router, upload_request(&parts)).await;
        assert_eq!(status, StatusCode::CREATED);
        let file_name = body["papers"][0]["fileName"].as_str().unwrap();

        let uri = format!("/uploads/Anna%20University/{}", file_name);
        let response = send_raw(&app.router, json_request(Method::GET, &uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 served");

        // A staged file never appears below the served root
        std::fs::create_dir_all(app.staging_root()).unwrap();
        std::fs::write(app.staging_root().join("upload-pending"), b"partial").unwrap();
        assert!(!app.staging_root().starts_with(app.upload_root()));
        for uri in ["/uploads/upload-pending", "/uploads/.staging/upload-pending"] {
            let response = send_raw(&app.router, json_request(Method::GET, uri, None)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_api() {
        let app = TestApp::with_config(|config| {
            config.rate_limit.enabled = true;
            config.rate_limit.requests_per_second = 1;
            config.rate_limit.burst = 1;
        });

        let (status, _) = send(&app.router, json_request(Method::GET, "/api/stats", None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app.router, json_request(Method::GET, "/api/stats", None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");

        let (status, _) = send(&app.router, json_request(Method::GET, "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
