//! Item repository.

use after10_core::{Item, ItemChanges, ItemId, ItemRow, NewItem, Price, SectionId, SectionName};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use super::RepositoryError;

const UNKNOWN_SECTION: &str = "section does not exist";

// =============================================================================
// Repository
// =============================================================================

/// Repository for item database operations.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all items in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Item>, RepositoryError> {
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

    /// Get an item by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            SELECT id, name, section, price, image, in_stock, addons
            FROM menu.item
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Item::try_from).transpose()?)
    }

    /// Create an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidReference` if the section doesn't exist.
    #[instrument(skip(self, item), fields(name = %item.name, section = %item.section))]
    pub async fn create(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            INSERT INTO menu.item (name, section, price, image, in_stock, addons)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, section, price, image, in_stock, addons
            ",
        )
        .bind(&item.name)
        .bind(item.section.as_str())
        .bind(item.price.amount())
        .bind(&item.image)
        .bind(item.in_stock)
        .bind(Json(&item.addons))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "duplicate item", UNKNOWN_SECTION))?;

        Ok(Item::try_from(row)?)
    }

    /// Replace every field of an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist, or
    /// `RepositoryError::InvalidReference` if the section doesn't exist.
    #[instrument(skip(self, item), fields(item_id = %id))]
    pub async fn replace(&self, id: ItemId, item: &NewItem) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            UPDATE menu.item
            SET name = $2, section = $3, price = $4, image = $5, in_stock = $6,
                addons = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, section, price, image, in_stock, addons
            ",
        )
        .bind(id.as_i32())
        .bind(&item.name)
        .bind(item.section.as_str())
        .bind(item.price.amount())
        .bind(&item.image)
        .bind(item.in_stock)
        .bind(Json(&item.addons))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "duplicate item", UNKNOWN_SECTION))?;

        Ok(Item::try_from(row.ok_or(RepositoryError::NotFound)?)?)
    }

    /// Update only the fields set in `changes`, in a single statement.
    ///
    /// Columns the update leaves unset keep whatever value is stored when the
    /// statement runs, so concurrent edits to other fields are not lost.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist, or
    /// `RepositoryError::InvalidReference` if the new section doesn't exist.
    #[instrument(skip(self, changes), fields(item_id = %id))]
    pub async fn update_partial(
        &self,
        id: ItemId,
        changes: &ItemChanges,
    ) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r"
            UPDATE menu.item
            SET name = COALESCE($2, name),
                section = COALESCE($3, section),
                price = COALESCE($4, price),
                image = COALESCE($5, image),
                in_stock = COALESCE($6, in_stock),
                addons = COALESCE($7, addons),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, section, price, image, in_stock, addons
            ",
        )
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.section.as_ref().map(SectionName::as_str))
        .bind(changes.price.as_ref().map(Price::amount))
        .bind(changes.image.as_deref())
        .bind(changes.in_stock)
        .bind(changes.addons.as_ref().map(Json))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "duplicate item", UNKNOWN_SECTION))?;

        Ok(Item::try_from(row.ok_or(RepositoryError::NotFound)?)?)
    }

    /// Delete an item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item doesn't exist.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM menu.item WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete every item listed under a section, keeping the section.
    ///
    /// Returns the number of items removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the section doesn't exist.
    #[instrument(skip(self), fields(section_id = %section_id))]
    pub async fn delete_by_section(&self, section_id: SectionId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM menu.section WHERE id = $1 FOR SHARE")
                .bind(section_id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let name = name.ok_or(RepositoryError::NotFound)?;

        let deleted = sqlx::query("DELETE FROM menu.item WHERE section = $1")
            .bind(&name)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        tracing::info!(section = %name, deleted, "Section items deleted");
        Ok(deleted)
    }
}
