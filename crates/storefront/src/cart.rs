//! Cart store.
//!
//! A cart is a list of [`CartLine`]s, one per distinct combination of item and
//! add-on selection. The full line list is written to the visitor's `cart`
//! slot after every mutation and read back when the store is constructed.
//!
//! Add-on selections are compared without regard to order: they are sorted by
//! `(name, price)` when a line is created and before every lookup.

use after10_core::{Addon, Item, ItemId, Price};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::slots::{SlotError, SlotStore};

/// Slot name holding the cart snapshot.
pub const CART_SLOT: &str = "cart";

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("item {0} not found")]
    UnknownItem(ItemId),

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("add-on '{addon}' is not offered with {item}")]
    UnknownAddon { item: String, addon: String },

    #[error("failed to persist cart: {0}")]
    Slot(#[from] SlotError),
}

/// One distinct item and add-on selection in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub cart_line_id: Uuid,
    pub item_id: ItemId,
    pub name: String,
    pub unit_price: Price,
    pub image: String,
    pub quantity: u32,
    pub selected_addons: Vec<Addon>,
}

impl CartLine {
    /// Price of one unit including its add-ons.
    #[must_use]
    pub fn unit_total(&self) -> Price {
        self.unit_price + self.selected_addons.iter().map(|a| a.price).sum::<Price>()
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_total() * self.quantity
    }

    /// The key that makes this line distinct within a cart.
    #[must_use]
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(self.item_id, &self.selected_addons)
    }
}

/// Item id plus canonicalized add-on selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    item_id: ItemId,
    addons: Vec<Addon>,
}

impl IdentityKey {
    #[must_use]
    pub fn new(item_id: ItemId, addons: &[Addon]) -> Self {
        Self {
            item_id,
            addons: canonical_addons(addons.to_vec()),
        }
    }
}

/// Sort add-ons into their canonical order.
#[must_use]
pub fn canonical_addons(mut addons: Vec<Addon>) -> Vec<Addon> {
    addons.sort_by(|a, b| a.name.cmp(&b.name).then(a.price.cmp(&b.price)));
    addons
}

/// Resolve add-on names chosen by the visitor against the item's own list.
///
/// Prices always come from the catalog, never from the client.
///
/// # Errors
///
/// Returns [`CartError::UnknownAddon`] if a name is not offered with the item.
pub fn resolve_addons(item: &Item, names: &[String]) -> Result<Vec<Addon>, CartError> {
    names
        .iter()
        .map(|name| {
            item.addon(name)
                .cloned()
                .ok_or_else(|| CartError::UnknownAddon {
                    item: item.name.clone(),
                    addon: name.clone(),
                })
        })
        .collect()
}

/// Cart state for one visitor.
///
/// A store holds a snapshot taken at [`CartStore::load`] and writes the whole
/// line list back on every mutation. Keep one live store per visitor; the
/// server guarantees this with [`crate::middleware::serialize_sessions`].
pub struct CartStore<S> {
    slots: S,
    lines: Vec<CartLine>,
}

impl<S: SlotStore> CartStore<S> {
    /// Construct a store from whatever snapshot the slot holds.
    ///
    /// A missing, unreadable, or corrupt snapshot yields an empty cart.
    pub async fn load(slots: S) -> Self {
        let lines = match slots.load(CART_SLOT).await {
            Ok(Some(value)) => match serde_json::from_value::<Vec<CartLine>>(value) {
                Ok(lines) => lines
                    .into_iter()
                    .filter(|line| line.quantity > 0)
                    .map(|mut line| {
                        line.selected_addons = canonical_addons(line.selected_addons);
                        line
                    })
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt cart snapshot");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read cart snapshot");
                Vec::new()
            }
        };

        Self { slots, lines }
    }

    /// Add `quantity` units of `item` with the given add-ons.
    ///
    /// Merges into an existing line with the same identity key, otherwise
    /// appends a new line. Returns the affected line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity (nothing is
    /// changed) or [`CartError::Slot`] if the snapshot could not be written.
    pub async fn add_item(
        &mut self,
        item: &Item,
        quantity: u32,
        addons: Vec<Addon>,
    ) -> Result<CartLine, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let addons = canonical_addons(addons);
        let line = if let Some(line) = self.line_mut(item.id, &addons) {
            line.quantity = line.quantity.saturating_add(quantity);
            line.clone()
        } else {
            let line = CartLine {
                cart_line_id: Uuid::new_v4(),
                item_id: item.id,
                name: item.name.clone(),
                unit_price: item.price,
                image: item.image.clone(),
                quantity,
                selected_addons: addons,
            };
            self.lines.push(line.clone());
            line
        };

        debug!(item_id = %item.id, quantity = line.quantity, "Cart line updated");
        self.persist().await?;
        Ok(line)
    }

    /// Set the quantity of a line exactly. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Slot`] if the snapshot could not be written.
    pub async fn update_quantity(
        &mut self,
        item_id: ItemId,
        addons: &[Addon],
        new_quantity: u32,
    ) -> Result<(), CartError> {
        if new_quantity < 1 {
            return self.remove_item(item_id, addons).await;
        }

        let addons = canonical_addons(addons.to_vec());
        let Some(line) = self.line_mut(item_id, &addons) else {
            return Ok(());
        };
        line.quantity = new_quantity;
        self.persist().await
    }

    /// Remove a line. Does nothing if no line matches.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Slot`] if the snapshot could not be written.
    pub async fn remove_item(&mut self, item_id: ItemId, addons: &[Addon]) -> Result<(), CartError> {
        let addons = canonical_addons(addons.to_vec());
        let Some(index) = self.position(item_id, &addons) else {
            return Ok(());
        };
        self.lines.remove(index);
        self.persist().await
    }

    /// Empty the cart and erase its snapshot.
    ///
    /// The in-memory cart is emptied even when erasing the snapshot fails.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Slot`] if the snapshot could not be erased.
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.slots.erase(CART_SLOT).await?;
        Ok(())
    }

    /// Sum of every line total.
    #[must_use]
    pub fn calculate_total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Snapshot of the cart for API responses.
    #[must_use]
    pub fn view(&self) -> CartView {
        CartView {
            lines: self.lines.clone(),
            item_count: self.item_count(),
            total: self.calculate_total(),
        }
    }

    fn line_mut(&mut self, item_id: ItemId, canonical: &[Addon]) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.item_id == item_id && line.selected_addons == canonical)
    }

    fn position(&self, item_id: ItemId, canonical: &[Addon]) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.item_id == item_id && line.selected_addons == canonical)
    }

    async fn persist(&self) -> Result<(), CartError> {
        let value = serde_json::to_value(&self.lines)
            .map_err(|e| SlotError::Unavailable(format!("cart serialization failed: {e}")))?;
        self.slots.save(CART_SLOT, value).await?;
        Ok(())
    }
}

/// Cart contents as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub total: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::slots::MemorySlots;
    use after10_core::SectionName;

    fn item(id: i32, price: i64) -> Item {
        Item {
            id: ItemId::new(id),
            name: format!("Item {id}"),
            section: SectionName::parse("Rolls").unwrap(),
            price: Price::from_rupees(price),
            image: format!("/uploads/{id}.jpg"),
            in_stock: true,
            addons: vec![
                Addon::new("Cheese", Price::from_rupees(20)),
                Addon::new("Mayo", Price::from_rupees(10)),
            ],
        }
    }

    fn cheese() -> Addon {
        Addon::new("Cheese", Price::from_rupees(20))
    }

    fn mayo() -> Addon {
        Addon::new("Mayo", Price::from_rupees(10))
    }

    #[tokio::test]
    async fn test_empty_cart_total_is_zero() {
        let cart = CartStore::load(MemorySlots::new()).await;
        assert!(cart.is_empty());
        assert_eq!(cart.calculate_total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[tokio::test]
    async fn test_same_identity_merges_quantities() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        let roll = item(1, 100);

        cart.add_item(&roll, 2, vec![cheese()]).await.unwrap();
        cart.add_item(&roll, 3, vec![cheese()]).await.unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_addon_order_does_not_matter() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        let roll = item(1, 100);

        cart.add_item(&roll, 1, vec![mayo(), cheese()]).await.unwrap();
        cart.add_item(&roll, 1, vec![cheese(), mayo()]).await.unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_distinct_keys_get_distinct_lines() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        let roll = item(1, 100);
        let wrap = item(2, 80);

        cart.add_item(&roll, 1, vec![]).await.unwrap();
        cart.add_item(&roll, 2, vec![cheese()]).await.unwrap();
        cart.add_item(&wrap, 4, vec![]).await.unwrap();
        cart.add_item(&roll, 1, vec![]).await.unwrap();

        assert_eq!(cart.lines().len(), 3);
        let quantities: Vec<u32> = cart.lines().iter().map(|l| l.quantity).collect();
        assert_eq!(quantities, vec![2, 2, 4]);
        assert_eq!(cart.item_count(), 8);
    }

    #[tokio::test]
    async fn test_zero_quantity_add_is_rejected() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        let result = cart.add_item(&item(1, 100), 0, vec![]).await;
        assert!(matches!(result, Err(CartError::InvalidQuantity)));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_total_includes_addons() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        cart.add_item(&item(1, 100), 2, vec![cheese()]).await.unwrap();
        assert_eq!(cart.calculate_total(), Price::from_rupees(240));
    }

    #[tokio::test]
    async fn test_update_quantity_replaces() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        let roll = item(1, 100);
        cart.add_item(&roll, 5, vec![]).await.unwrap();

        cart.update_quantity(roll.id, &[], 2).await.unwrap();
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_update_to_zero_equals_remove() {
        let slots = MemorySlots::new();
        let mut updated = CartStore::load(slots.clone()).await;
        let mut removed = CartStore::load(MemorySlots::new()).await;
        let roll = item(1, 100);

        for cart in [&mut updated, &mut removed] {
            cart.add_item(&roll, 1, vec![cheese()]).await.unwrap();
            cart.add_item(&roll, 1, vec![]).await.unwrap();
        }

        updated.update_quantity(roll.id, &[cheese()], 0).await.unwrap();
        removed.remove_item(roll.id, &[cheese()]).await.unwrap();

        let keys = |c: &CartStore<MemorySlots>| {
            c.lines()
                .iter()
                .map(CartLine::identity_key)
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&updated), keys(&removed));
        assert_eq!(updated.lines().len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_line_is_noop() {
        let mut cart = CartStore::load(MemorySlots::new()).await;
        cart.update_quantity(ItemId::new(9), &[], 3).await.unwrap();
        cart.remove_item(ItemId::new(9), &[]).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reload() {
        let slots = MemorySlots::new();
        let mut cart = CartStore::load(slots.clone()).await;
        cart.add_item(&item(1, 100), 2, vec![cheese()]).await.unwrap();
        let before = cart.lines().to_vec();

        let reloaded = CartStore::load(slots).await;
        assert_eq!(reloaded.lines(), before.as_slice());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let slots = MemorySlots::new();
        slots
            .put(CART_SLOT, serde_json::json!({"not": "a cart"}))
            .await;
        let cart = CartStore::load(slots).await;
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_clear_erases_snapshot() {
        let slots = MemorySlots::new();
        let mut cart = CartStore::load(slots.clone()).await;
        cart.add_item(&item(1, 100), 1, vec![]).await.unwrap();
        assert!(slots.get(CART_SLOT).await.is_some());

        cart.clear().await.unwrap();
        assert!(cart.is_empty());
        assert!(slots.get(CART_SLOT).await.is_none());
    }

    #[test]
    fn test_resolve_addons_uses_catalog_prices() {
        let roll = item(1, 100);
        let addons = resolve_addons(&roll, &["Mayo".to_string()]).unwrap();
        assert_eq!(addons, vec![mayo()]);

        let err = resolve_addons(&roll, &["Gold leaf".to_string()]).unwrap_err();
        assert!(matches!(err, CartError::UnknownAddon { .. }));
    }
}
