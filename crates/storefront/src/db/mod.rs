//! Database access for the storefront.
//!
//! # Schemas
//!
//! - `menu.section`, `menu.item` - Menu catalog, owned by the admin service
//!   and read here
//! - `tower_sessions.session` - Visitor sessions holding the `cart` and
//!   `location` slots
//!
//! # Migrations
//!
//! The session table migration lives in `crates/storefront/migrations/` and the
//! menu schema in `crates/admin/migrations/`. Both run via:
//! ```bash
//! cargo run -p after10-cli -- migrate all
//! ```

pub mod catalog;

use std::time::Duration;

use after10_core::RowError;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl From<RowError> for RepositoryError {
    fn from(err: RowError) -> Self {
        Self::DataCorruption(err.to_string())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
