//! Section repository.
//!
//! Items point at sections by name, so renaming or deleting a section also
//! touches its items. Both happen inside one transaction.

use after10_core::{Section, SectionId, SectionName, SectionRow};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

const DUPLICATE_SECTION: &str = "Section already exists";

/// Outcome of a cascading section delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDeletion {
    pub section_deleted: bool,
    pub items_deleted_count: u64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for section database operations.
pub struct SectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SectionRepository<'a> {
    /// Create a new section repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all sections ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Section>, RepositoryError> {
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

    /// Get a section by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: SectionId) -> Result<Option<Section>, RepositoryError> {
        let row = sqlx::query_as::<_, SectionRow>(
            r"
            SELECT id, name, created_at
            FROM menu.section
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Section::try_from).transpose()?)
    }

    /// Create a section.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    #[instrument(skip(self), fields(name = %name))]
    pub async fn create(&self, name: &SectionName) -> Result<Section, RepositoryError> {
        let row = sqlx::query_as::<_, SectionRow>(
            r"
            INSERT INTO menu.section (name)
            VALUES ($1)
            RETURNING id, name, created_at
            ",
        )
        .bind(name.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, DUPLICATE_SECTION, "section"))?;

        Ok(Section::try_from(row)?)
    }

    /// Rename a section and move its items along with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the section doesn't exist, or
    /// `RepositoryError::Conflict` if another section already has the name.
    #[instrument(skip(self), fields(section_id = %id, name = %name))]
    pub async fn rename(
        &self,
        id: SectionId,
        name: &SectionName,
    ) -> Result<Section, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET CONSTRAINTS menu.item_section_fk DEFERRED")
            .execute(&mut *tx)
            .await?;

        let old_name: Option<String> =
            sqlx::query_scalar("SELECT name FROM menu.section WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let old_name = old_name.ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, SectionRow>(
            r"
            UPDATE menu.section
            SET name = $2
            WHERE id = $1
            RETURNING id, name, created_at
            ",
        )
        .bind(id.as_i32())
        .bind(name.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, DUPLICATE_SECTION, "section"))?;

        let moved = sqlx::query(
            r"
            UPDATE menu.item
            SET section = $2, updated_at = NOW()
            WHERE section = $1
            ",
        )
        .bind(&old_name)
        .bind(name.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::info!(from = %old_name, items_moved = moved, "Section renamed");
        Ok(Section::try_from(row)?)
    }

    /// Delete a section and every item listed under it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the section doesn't exist.
    #[instrument(skip(self), fields(section_id = %id))]
    pub async fn delete_cascade(&self, id: SectionId) -> Result<SectionDeletion, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM menu.section WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let name = name.ok_or(RepositoryError::NotFound)?;

        let items_deleted_count = sqlx::query("DELETE FROM menu.item WHERE section = $1")
            .bind(&name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let section_deleted = sqlx::query("DELETE FROM menu.section WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await?;

        tracing::info!(section = %name, items_deleted_count, "Section deleted");
        Ok(SectionDeletion {
            section_deleted,
            items_deleted_count,
        })
    }
}
