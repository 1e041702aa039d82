//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::MenuCatalog;
use crate::config::StorefrontConfig;
use crate::location::{GeocodeError, NominatimClient};
use crate::middleware::SessionLocks;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: MenuCatalog,
    geocoder: NominatimClient,
    session_locks: SessionLocks,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the geocoding HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, GeocodeError> {
        let geocoder = NominatimClient::new(&config.geocoder)?;
        let catalog = MenuCatalog::new(config.catalog_cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                geocoder,
                session_locks: SessionLocks::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the cached menu catalog.
    #[must_use]
    pub fn catalog(&self) -> &MenuCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the reverse geocoding client.
    #[must_use]
    pub fn geocoder(&self) -> &NominatimClient {
        &self.inner.geocoder
    }

    /// Get the per-session request locks.
    #[must_use]
    pub fn session_locks(&self) -> &SessionLocks {
        &self.inner.session_locks
    }
}
