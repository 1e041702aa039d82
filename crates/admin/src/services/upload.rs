//! Image uploads for menu items.
//!
//! With a media host configured, images go to its unsigned upload endpoint
//! and the returned `secure_url` is used. Otherwise the file is written to the
//! local uploads directory and served from `/uploads/<ts>_<name>`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::MediaConfig;

/// Media host upload API base.
const MEDIA_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Public path prefix for locally stored uploads.
pub const UPLOADS_PATH: &str = "/uploads";

/// Errors that can occur while storing an image.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No bytes were sent.
    #[error("uploaded file is empty")]
    EmptyFile,

    /// HTTP request to the media host failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Media host rejected the upload.
    #[error("media host returned {status}")]
    Rejected { status: u16 },

    /// Media host response could not be read.
    #[error("parse error: {0}")]
    Parse(String),

    /// Writing to the local uploads directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Whether the failure came from the external media host.
    #[must_use]
    pub const fn is_gateway(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Rejected { .. } | Self::Parse(_))
    }
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    secure_url: String,
}

/// Where uploaded images end up.
#[derive(Debug, Clone)]
pub struct ImageUploader {
    client: reqwest::Client,
    media: Option<MediaConfig>,
    uploads_dir: PathBuf,
}

impl ImageUploader {
    /// Create an uploader.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(media: Option<MediaConfig>, uploads_dir: PathBuf) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            media,
            uploads_dir,
        })
    }

    /// Whether images go to the media host rather than the local directory.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.media.is_some()
    }

    /// Store an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::EmptyFile` for an empty body, a gateway error if
    /// the media host fails, or `UploadError::Io` if the local write fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn store(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        match &self.media {
            Some(media) => self.upload_to_media_host(media, file_name, bytes).await,
            None => {
                let now_ms = chrono::Utc::now().timestamp_millis();
                save_local(&self.uploads_dir, file_name, &bytes, now_ms).await
            }
        }
    }

    async fn upload_to_media_host(
        &self,
        media: &MediaConfig,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, UploadError> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(sanitize_file_name(file_name)))
            .text("upload_preset", media.upload_preset.clone());

        let response = self
            .client
            .post(media_upload_url(media))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Media host rejected upload");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: MediaResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Parse(format!("Failed to parse response: {e}")))?;
        Ok(body.secure_url)
    }
}

/// Unsigned image upload endpoint for a media host account.
fn media_upload_url(media: &MediaConfig) -> String {
    format!("{MEDIA_API_BASE}/{}/image/upload", media.cloud_name)
}

/// Reduce a client-supplied file name to a safe single path segment.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write `bytes` to `<dir>/<now_ms>_<name>` and return its public URL.
async fn save_local(
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
    now_ms: i64,
) -> Result<String, UploadError> {
    let stored = format!("{now_ms}_{}", sanitize_file_name(file_name));
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(&stored), bytes).await?;
    tracing::info!(file = %stored, "Image stored locally");
    Ok(format!("{UPLOADS_PATH}/{stored}"))
}
