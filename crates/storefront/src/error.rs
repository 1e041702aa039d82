//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error response is a JSON object with an `error` message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::db::RepositoryError;
use crate::location::{LocationError, PositionError};
use crate::slots::SlotError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Location operation failed.
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    /// Checkout was rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] SlotError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Session(_)
                | Self::Cart(CartError::Slot(_))
                | Self::Location(LocationError::Slot(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Cart(err) => match err {
                CartError::InvalidQuantity | CartError::UnknownAddon { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CartError::UnknownItem(_) => StatusCode::NOT_FOUND,
                CartError::OutOfStock(_) => StatusCode::CONFLICT,
                CartError::Slot(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Location(err) => match err {
                LocationError::Denied | LocationError::Position(PositionError::PermissionDenied) => {
                    StatusCode::FORBIDDEN
                }
                LocationError::Position(_) => StatusCode::UNPROCESSABLE_ENTITY,
                LocationError::Coordinates(_) => StatusCode::BAD_REQUEST,
                LocationError::Slot(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::MissingFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            _ if self.is_server_error() => json!({ "error": "Internal server error" }),
            Self::Cart(err) => json!({ "error": err.to_string() }),
            Self::Location(err) => json!({ "error": err.to_string() }),
            Self::Checkout(CheckoutError::MissingFields(fields)) => json!({
                "error": "Please fill in all required fields",
                "missingFields": fields,
            }),
            Self::Checkout(err) => json!({ "error": err.to_string() }),
            Self::NotFound(what) => json!({ "error": format!("Not found: {what}") }),
            Self::BadRequest(msg) => json!({ "error": msg }),
            _ => json!({ "error": "Internal server error" }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for visitor actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
