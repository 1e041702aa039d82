//! Database row shapes for the `menu` schema (with `postgres` feature).
//!
//! Both the admin repositories and the storefront catalog read these tables,
//! so the rows and their conversions into domain types live here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use thiserror::Error;

use super::id::{ItemId, SectionId};
use super::menu::{Addon, Item, Section};
use super::price::Price;
use super::section::{SectionName, SectionNameError};

/// A stored row that does not satisfy the domain rules.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("invalid section name in database: {0}")]
    SectionName(SectionNameError),

    #[error("item {id} has invalid section name: {source}")]
    ItemSection { id: i32, source: SectionNameError },
}

/// A `menu.section` row.
#[derive(Debug, sqlx::FromRow)]
pub struct SectionRow {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SectionRow> for Section {
    type Error = RowError;

    fn try_from(row: SectionRow) -> Result<Self, Self::Error> {
        let name = SectionName::parse(&row.name).map_err(RowError::SectionName)?;
        Ok(Self {
            id: SectionId::new(row.id),
            name,
            created_at: row.created_at,
        })
    }
}

/// A `menu.item` row.
#[derive(Debug, sqlx::FromRow)]
pub struct ItemRow {
    pub id: i32,
    pub name: String,
    pub section: String,
    pub price: Decimal,
    pub image: String,
    pub in_stock: bool,
    pub addons: Json<Vec<Addon>>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RowError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let section = SectionName::parse(&row.section).map_err(|source| RowError::ItemSection {
            id: row.id,
            source,
        })?;
        Ok(Self {
            id: ItemId::new(row.id),
            name: row.name,
            section,
            price: Price::new(row.price),
            image: row.image,
            in_stock: row.in_stock,
            addons: row.addons.0,
        })
    }
}
