//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every handler returns the full
//! cart so the client can re-render from a single response.

use after10_core::{Addon, ItemId};
use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::{CartError, CartStore, CartView, resolve_addons};
use crate::db::CatalogRepository;
use crate::error::{Result, add_breadcrumb};
use crate::slots::SessionSlots;
use crate::state::AppState;

/// Add to cart request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub item_id: ItemId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Names of the chosen add-ons.
    #[serde(default)]
    pub addons: Vec<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub item_id: ItemId,
    #[serde(default)]
    pub addons: Vec<Addon>,
    pub quantity: u32,
}

/// Remove line request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub item_id: ItemId,
    #[serde(default)]
    pub addons: Vec<Addon>,
}

async fn open_cart(session: Session) -> CartStore<SessionSlots> {
    CartStore::load(SessionSlots::new(session)).await
}

/// Current cart contents.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    Json(open_cart(session).await.view())
}

/// Add an item from the catalog to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let catalog = state
        .catalog()
        .load(&CatalogRepository::new(state.pool()))
        .await?;
    let item = catalog
        .find_item(request.item_id)
        .ok_or(CartError::UnknownItem(request.item_id))?;
    if !item.in_stock {
        return Err(CartError::OutOfStock(item.name.clone()).into());
    }
    let addons = resolve_addons(item, &request.addons)?;

    let mut cart = open_cart(session).await;
    cart.add_item(item, request.quantity, addons).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("item_id", &request.item_id.to_string())]),
    );
    Ok(Json(cart.view()))
}

/// Set a line's quantity. Zero removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = open_cart(session).await;
    cart.update_quantity(request.item_id, &request.addons, request.quantity)
        .await?;
    Ok(Json(cart.view()))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = open_cart(session).await;
    cart.remove_item(request.item_id, &request.addons).await?;
    Ok(Json(cart.view()))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = open_cart(session).await;
    cart.clear().await?;
    Ok(Json(cart.view()))
}
