//! Unified error handling for admin.
//!
//! Every error response is JSON. Handler errors carry `status: "error"` and a
//! human readable `message`, plus `error` with the same text for clients that
//! only read that field.

use after10_core::{ItemError, SectionNameError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::UploadError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Image upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Section payload was invalid.
    #[error("Invalid section: {0}")]
    InvalidSection(#[from] SectionNameError),

    /// Item payload was invalid.
    #[error("Invalid item: {0}")]
    InvalidItem(#[from] ItemError),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller did not present the API token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err) => matches!(
                err,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ),
            Self::Upload(err) => !matches!(err, UploadError::EmptyFile),
            Self::Internal(_) => true,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Upload(err) if err.is_gateway() => StatusCode::BAD_GATEWAY,
            Self::Upload(UploadError::EmptyFile) => StatusCode::BAD_REQUEST,
            Self::Upload(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidSection(_) | Self::InvalidItem(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(RepositoryError::InvalidReference(what)) => {
                format!("Invalid reference: {what}")
            }
            Self::Upload(err) if err.is_gateway() => "File upload failed".to_string(),
            Self::Upload(UploadError::EmptyFile) => "No file uploaded".to_string(),
            Self::InvalidSection(err) => err.to_string(),
            Self::InvalidItem(err) => err.to_string(),
            Self::NotFound(_) | Self::Unauthorized => self.to_string(),
            Self::BadRequest(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();
        let message = self.public_message();
        let body = json!({
            "status": "error",
            "message": message,
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
