//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{ImageUploader, UploadError};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    uploader: ImageUploader,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, UploadError> {
        let uploader = ImageUploader::new(config.media.clone(), config.uploads_dir.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                uploader,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the image uploader.
    #[must_use]
    pub fn uploader(&self) -> &ImageUploader {
        &self.inner.uploader
    }

    /// The bearer token `/api` callers must present.
    #[must_use]
    pub fn api_token(&self) -> &SecretString {
        &self.inner.config.api_token
    }
}
