//! Session middleware configuration.
//!
//! Visitor sessions are stored in `PostgreSQL` using tower-sessions. The
//! session holds the `cart` and `location` slots.
//!
//! A session record is loaded when a handler first touches it and written
//! back after the response, so two overlapping requests from one visitor
//! would each save their own copy. [`serialize_sessions`] runs outside the
//! session layer and holds a per-cookie lock across that whole cycle.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::Response,
};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tower_sessions::cookie::{Key, KeyError};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "a10_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How long an unused session lock is kept.
const LOCK_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Upper bound on tracked session locks.
const MAX_TRACKED_SESSIONS: u64 = 100_000;

/// Build the cookie signing key from the session secret.
///
/// # Errors
///
/// Returns `KeyError` if the secret is shorter than 64 bytes.
pub fn session_key(secret: &SecretString) -> Result<Key, KeyError> {
    Key::try_from(secret.expose_secret().as_bytes())
}

/// Create the session layer with `PostgreSQL` store and signed cookies.
///
/// The `tower_sessions.session` table must exist; it is created by the
/// storefront migrations.
///
/// # Errors
///
/// Returns `KeyError` if the session secret is too short to sign with.
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<PostgresStore, SignedCookie>, KeyError> {
    let store = PostgresStore::new(pool.clone());
    let key = session_key(&config.session_secret)?;

    // Secure cookies only when served over HTTPS
    let is_secure = config.base_url.starts_with("https://");

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

/// One async lock per session cookie.
#[derive(Clone)]
pub struct SessionLocks {
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    #[must_use]
    pub fn new() -> Self {
        let locks = Cache::builder()
            .max_capacity(MAX_TRACKED_SESSIONS)
            .time_to_idle(LOCK_IDLE_TIMEOUT)
            .build();
        Self { locks }
    }

    /// The lock for a session cookie value, created on first use.
    pub async fn lock_for(&self, cookie: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(cookie.to_string(), async { Arc::new(Mutex::new(())) })
            .await
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLocks")
            .field("tracked", &self.locks.entry_count())
            .finish()
    }
}

/// The session cookie value sent with a request, if any.
fn session_cookie(request: &Request) -> Option<&str> {
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Run requests that carry the same session cookie one at a time.
///
/// Must be layered outside the session layer so the session save happens
/// before the lock is released. Requests without a cookie get a fresh
/// session and need no lock.
pub async fn serialize_sessions(
    State(locks): State<SessionLocks>,
    request: Request,
    next: Next,
) -> Response {
    let Some(cookie) = session_cookie(&request).map(str::to_string) else {
        return next.run(request).await;
    };

    let lock = locks.lock_for(&cookie).await;
    let _guard = lock.lock().await;
    next.run(request).await
}
