//! Integration tests for After10.
//!
//! # Running Tests
//!
//! ```bash
//! # Pure cross-crate flows, no services needed
//! cargo test -p after10-integration-tests
//!
//! # Against running servers and a migrated database
//! a10-cli migrate all
//! cargo run -p after10-admin &
//! cargo run -p after10-storefront &
//! cargo test -p after10-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `ordering_flow` - Cart, location and checkout wired together in memory
//! - `admin_api` - Admin HTTP API (requires running admin server)
//! - `admin_repository` - Menu repositories (requires database)
//! - `dashboard` - Dashboard over the real client (requires running admin server)
//! - `storefront_api` - Storefront HTTP API (requires running storefront)
//!
//! # Environment Variables
//!
//! - `ADMIN_BASE_URL` - Admin server (default: `http://localhost:3001`)
//! - `STOREFRONT_BASE_URL` - Storefront server (default: `http://localhost:3000`)
//! - `ADMIN_API_TOKEN` - Token configured on the admin server
//! - `ADMIN_DATABASE_URL` - Database for repository tests (falls back to `DATABASE_URL`)

use after10_admin::client::AdminApi;
use reqwest::Client;
use secrecy::SecretString;
use sqlx::PgPool;

/// Base URL for the admin API.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Base URL for the storefront API.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// The admin API token from the environment.
///
/// # Panics
///
/// Panics if `ADMIN_API_TOKEN` is not set.
#[must_use]
#[allow(clippy::expect_used)]
pub fn admin_token() -> SecretString {
    SecretString::from(std::env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN must be set"))
}

/// HTTP client carrying the admin bearer token.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn admin_client() -> Client {
    use secrecy::ExposeSecret;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        format!("Bearer {}", admin_token().expose_secret())
            .parse()
            .expect("token is a valid header value"),
    );
    Client::builder()
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// Typed admin API client.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn admin_api() -> AdminApi {
    AdminApi::new(&admin_base_url(), &admin_token()).expect("Failed to create admin API client")
}

/// HTTP client with a cookie jar, so the storefront session sticks.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn storefront_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the admin database.
///
/// # Panics
///
/// Panics if no database URL is set or the connection fails.
#[allow(clippy::expect_used)]
pub async fn admin_pool() -> PgPool {
    let url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("ADMIN_DATABASE_URL or DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// A name no other test run will use, within the 50 character section limit.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix} {}", suffix.get(..8).unwrap_or(&suffix))
}
