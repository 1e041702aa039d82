//! Item route handlers.

use after10_core::{ItemId, ItemInput, ItemPatch, SectionId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::db::ItemRepository;
use crate::error::{AppError, Result};
use crate::models::{DeleteEnvelope, ItemDeleted, ItemEnvelope, ItemsDeleted, ItemsEnvelope};
use crate::state::AppState;

/// List all items.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<ItemsEnvelope>> {
    let items = ItemRepository::new(state.pool()).list().await?;
    Ok(Json(ItemsEnvelope { items }))
}

/// Create an item.
#[instrument(skip(state, input))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ItemInput>,
) -> Result<(StatusCode, Json<ItemEnvelope>)> {
    let new_item = input.validate()?;
    let item = ItemRepository::new(state.pool()).create(&new_item).await?;
    Ok((StatusCode::CREATED, Json(ItemEnvelope { item })))
}

/// Replace an item.
#[instrument(skip(state, input))]
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(input): Json<ItemInput>,
) -> Result<Json<ItemEnvelope>> {
    let new_item = input.validate()?;
    let item = ItemRepository::new(state.pool())
        .replace(id, &new_item)
        .await?;
    Ok(Json(ItemEnvelope { item }))
}

/// Update some fields of an item, typically `inStock`.
#[instrument(skip(state, patch))]
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<ItemEnvelope>> {
    let changes = patch.validate()?;
    let repo = ItemRepository::new(state.pool());
    let item = if changes.is_empty() {
        repo.get(id).await?.ok_or(AppError::NotFound("Item"))?
    } else {
        repo.update_partial(id, &changes).await?
    };
    Ok(Json(ItemEnvelope { item }))
}

/// Delete an item.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> Result<Json<DeleteEnvelope<ItemDeleted>>> {
    ItemRepository::new(state.pool()).delete(id).await?;
    Ok(Json(DeleteEnvelope::success(
        "Item deleted successfully",
        ItemDeleted { item_deleted: true },
    )))
}

/// Delete every item in a section, keeping the section.
#[instrument(skip(state))]
pub async fn delete_by_section(
    State(state): State<AppState>,
    Path(section_id): Path<SectionId>,
) -> Result<Json<DeleteEnvelope<ItemsDeleted>>> {
    let deleted_count = ItemRepository::new(state.pool())
        .delete_by_section(section_id)
        .await?;
    Ok(Json(DeleteEnvelope::success(
        "Items deleted successfully",
        ItemsDeleted { deleted_count },
    )))
}
