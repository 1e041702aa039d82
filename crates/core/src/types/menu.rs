//! Menu records: sections, items and their add-ons.
//!
//! These are the shapes stored by the admin API and read by the storefront.
//! Untrusted input enters through [`ItemInput::validate`], which produces a
//! [`NewItem`] that is safe to persist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ItemId, SectionId};
use super::price::Price;
use super::section::{SectionName, SectionNameError};

/// An optional extra that can be ordered with an item, e.g. "Extra cheese".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Addon {
    pub name: String,
    pub price: Price,
}

impl Addon {
    /// Create an add-on.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// A menu section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub name: SectionName,
    pub created_at: DateTime<Utc>,
}

/// A menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Name of the section this item belongs to.
    pub section: SectionName,
    pub price: Price,
    /// Public image URL.
    pub image: String,
    pub in_stock: bool,
    pub addons: Vec<Addon>,
}

impl Item {
    /// Look up one of this item's add-ons by name.
    #[must_use]
    pub fn addon(&self, name: &str) -> Option<&Addon> {
        self.addons.iter().find(|a| a.name == name)
    }
}

/// Errors produced when validating item input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("item name cannot be empty")]
    EmptyName,
    #[error("invalid section: {0}")]
    Section(#[from] SectionNameError),
    #[error("price must be greater than zero")]
    NonPositivePrice,
    #[error("image is required")]
    MissingImage,
    #[error("add-on '{0}' cannot have a negative price")]
    NegativeAddonPrice(String),
}

/// A single add-on row as submitted by the item form.
///
/// Blank rows are allowed and dropped during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddonInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Option<Price>,
}

/// Raw item payload from the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub name: String,
    pub section: String,
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub in_stock: Option<bool>,
    /// `null` is accepted and means no add-ons.
    #[serde(default)]
    pub addons: Option<Vec<AddonInput>>,
}

/// A validated item ready to be inserted or to replace an existing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub section: SectionName,
    pub price: Price,
    pub image: String,
    pub in_stock: bool,
    pub addons: Vec<Addon>,
}

impl ItemInput {
    /// Validate the payload.
    ///
    /// Add-on rows missing a name or a price are discarded, matching how the
    /// item form treats its blank trailing rows.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemError`] describing the first invalid field.
    pub fn validate(self) -> Result<NewItem, ItemError> {
        Ok(NewItem {
            name: item_name(&self.name)?,
            section: SectionName::parse(&self.section)?,
            price: item_price(self.price)?,
            image: item_image(&self.image)?,
            in_stock: self.in_stock.unwrap_or(true),
            addons: item_addons(self.addons.unwrap_or_default())?,
        })
    }
}

fn item_name(raw: &str) -> Result<String, ItemError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ItemError::EmptyName);
    }
    Ok(name.to_owned())
}

fn item_price(price: Price) -> Result<Price, ItemError> {
    if !price.is_positive() {
        return Err(ItemError::NonPositivePrice);
    }
    Ok(price)
}

fn item_image(raw: &str) -> Result<String, ItemError> {
    let image = raw.trim();
    if image.is_empty() {
        return Err(ItemError::MissingImage);
    }
    Ok(image.to_owned())
}

fn item_addons(rows: Vec<AddonInput>) -> Result<Vec<Addon>, ItemError> {
    let mut addons = Vec::with_capacity(rows.len());
    for row in rows {
        let addon_name = row.name.trim();
        let Some(price) = row.price else { continue };
        if addon_name.is_empty() {
            continue;
        }
        if price.is_negative() {
            return Err(ItemError::NegativeAddonPrice(addon_name.to_owned()));
        }
        addons.push(Addon::new(addon_name, price));
    }
    Ok(addons)
}

impl From<Addon> for AddonInput {
    fn from(addon: Addon) -> Self {
        Self {
            name: addon.name,
            price: Some(addon.price),
        }
    }
}

impl From<NewItem> for ItemInput {
    fn from(item: NewItem) -> Self {
        Self {
            name: item.name,
            section: item.section.into_inner(),
            price: item.price,
            image: item.image,
            in_stock: Some(item.in_stock),
            addons: Some(item.addons.into_iter().map(AddonInput::from).collect()),
        }
    }
}

/// Partial item update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addons: Option<Vec<AddonInput>>,
}

/// A validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub section: Option<SectionName>,
    pub price: Option<Price>,
    pub image: Option<String>,
    pub in_stock: Option<bool>,
    pub addons: Option<Vec<Addon>>,
}

impl ItemChanges {
    /// Whether the update sets nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.section.is_none()
            && self.price.is_none()
            && self.image.is_none()
            && self.in_stock.is_none()
            && self.addons.is_none()
    }
}

impl ItemPatch {
    /// Patch that only flips availability.
    #[must_use]
    pub fn stock(in_stock: bool) -> Self {
        Self {
            in_stock: Some(in_stock),
            ..Self::default()
        }
    }

    /// Validate only the fields the patch sets.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemError`] describing the first invalid field.
    pub fn validate(self) -> Result<ItemChanges, ItemError> {
        Ok(ItemChanges {
            name: self.name.as_deref().map(item_name).transpose()?,
            section: self
                .section
                .as_deref()
                .map(SectionName::parse)
                .transpose()?,
            price: self.price.map(item_price).transpose()?,
            image: self.image.as_deref().map(item_image).transpose()?,
            in_stock: self.in_stock,
            addons: self.addons.map(item_addons).transpose()?,
        })
    }

    /// Merge the patch over `current` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemError`] when the merged item is invalid.
    pub fn apply_to(self, current: &Item) -> Result<NewItem, ItemError> {
        ItemInput {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            section: self
                .section
                .unwrap_or_else(|| current.section.as_str().to_owned()),
            price: self.price.unwrap_or(current.price),
            image: self.image.unwrap_or_else(|| current.image.clone()),
            in_stock: Some(self.in_stock.unwrap_or(current.in_stock)),
            addons: Some(self.addons.unwrap_or_else(|| {
                current.addons.iter().cloned().map(AddonInput::from).collect()
            })),
        }
        .validate()
    }
}
