//! Read-only access to the menu catalog.

use after10_core::{Item, ItemRow, Section, SectionRow};
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;
use crate::catalog::CatalogSource;

/// Repository for reading sections and items.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All sections, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_sections(&self) -> Result<Vec<Section>, RepositoryError> {
        let rows = sqlx::query_as::<_, SectionRow>(
            r"
            SELECT id, name, created_at
            FROM menu.section
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(Section::try_from)
            .collect::<Result<_, _>>()?)
    }

    /// All items in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, name, section, price, image, in_stock, addons
            FROM menu.item
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(Item::try_from)
            .collect::<Result<_, _>>()?)
    }
}

impl CatalogSource for CatalogRepository<'_> {
    async fn sections(&self) -> Result<Vec<Section>, RepositoryError> {
        self.list_sections().await
    }

    async fn items(&self) -> Result<Vec<Item>, RepositoryError> {
        self.list_items().await
    }
}
