//! On-disk storage for uploaded paper files
//!
//! Files are streamed into the staging directory first and moved into
//! `<root>/<university name>/` only once the whole request has been accepted.
//! The staging directory lives outside `<root>`, which is served publicly.

use axum::{
    extract::multipart::{Field, MultipartError},
    http::StatusCode,
};
use pyqhub_common::{
    config::StorageConfig,
    errors::{AppError, Result},
};
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Multipart framing and text fields on top of the file payloads
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Prefix of generated file names, matching the multipart field name
const STORED_NAME_PREFIX: &str = "papers";

/// A fully received file that has not been placed yet
#[derive(Debug)]
pub struct StagedFile {
    /// Client-side file name, directory components removed
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub path: PathBuf,
}

/// A file in its final location
#[derive(Debug)]
pub struct StoredFile {
    pub file_name: String,
    pub path: PathBuf,
}

/// Upload directory tree keyed by university name
#[derive(Debug, Clone)]
pub struct UploadStore {
    config: StorageConfig,
    staging: PathBuf,
}

impl UploadStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            staging: config.staging_root(),
            config: config.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.config.upload_dir
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging
    }

    /// Largest request body accepted by the upload route
    pub fn body_limit(&self) -> usize {
        (self.config.max_file_size_bytes as usize)
            .saturating_mul(self.config.max_files_per_upload)
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }

    /// Map a multipart read failure; hitting the body limit is a 413
    pub fn multipart_error(&self, e: MultipartError) -> AppError {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::BodyTooLarge {
                limit: self.body_limit() as u64,
            }
        } else {
            AppError::InvalidFormat {
                message: format!("Malformed multipart body: {}", e),
            }
        }
    }

    /// Largest number of file parts accepted in one request
    pub fn max_files(&self) -> usize {
        self.config.max_files_per_upload
    }

    /// Make sure both directories exist and the staging area is writable
    pub async fn check_writable(&self) -> Result<()> {
        tokio::fs::create_dir_all(self.root()).await?;
        tokio::fs::create_dir_all(&self.staging).await?;

        let probe = self.staging.join(format!("probe-{}", Uuid::new_v4()));
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await?;
        Ok(())
    }

    /// Stream one multipart file part into the staging area.
    ///
    /// Rejects parts without a file name, with a MIME type outside the
    /// allowed list, or larger than the per-file limit. Nothing is left on
    /// disk when this fails.
    pub async fn stage(&self, mut field: Field<'_>) -> Result<StagedFile> {
        let original_name = field
            .file_name()
            .map(client_file_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::Validation {
                message: "File part must have a filename".to_string(),
                field: Some("papers".to_string()),
            })?;

        let mime_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| mime_guess::from_path(&original_name).first().map(|m| m.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !self.config.accepts_mime_type(&mime_type) {
            return Err(AppError::UnsupportedMediaType { mime_type });
        }

        tokio::fs::create_dir_all(&self.staging).await?;
        let path = self.staging.join(format!("upload-{}", Uuid::new_v4()));

        let written = async {
            let mut file = tokio::fs::File::create(&path).await?;
            let mut size: u64 = 0;

            while let Some(chunk) = field.chunk().await.map_err(|e| self.multipart_error(e))? {
                size += chunk.len() as u64;
                if size > self.config.max_file_size_bytes {
                    return Err(AppError::PayloadTooLarge {
                        size,
                        limit: self.config.max_file_size_bytes,
                    });
                }
                file.write_all(&chunk).await?;
            }

            file.flush().await?;
            Ok::<u64, AppError>(size)
        }
        .await;

        match written {
            Ok(size) => Ok(StagedFile {
                original_name,
                mime_type,
                size,
                path,
            }),
            Err(e) => {
                self.discard(&path).await;
                Err(e)
            }
        }
    }

    /// Move a staged file under the university's directory with a fresh name
    pub async fn commit(&self, staged: &StagedFile, university_name: &str) -> Result<StoredFile> {
        let dir = self.root().join(directory_name(university_name));
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = stored_file_name(&staged.original_name);
        let path = dir.join(&file_name);
        tokio::fs::rename(&staged.path, &path).await?;

        Ok(StoredFile { file_name, path })
    }

    /// Remove a file, ignoring failures
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload file");
            }
        }
    }
}

/// Paper title derived from the client file name: the name without its extension
pub fn title_from_file_name(original_name: &str) -> String {
    Path::new(original_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_name.to_string())
}

/// Last path component of a client-supplied name (browsers on Windows may send full paths)
fn client_file_name(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim().to_string()
}

/// Directory name for a university; only a conservative character set survives
fn directory_name(university_name: &str) -> String {
    let cleaned: String = university_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// `papers-<unix millis>-<random><.ext>`
fn stored_file_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    let extension = Path::new(original_name)
        .extension()
        .map(|ext| {
            ext.to_string_lossy()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
        })
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    format!("{}-{}-{}{}", STORED_NAME_PREFIX, millis, suffix, extension)
}
