//! Core types for After10.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod geo;
pub mod id;
pub mod menu;
pub mod price;
#[cfg(feature = "postgres")]
pub mod rows;
pub mod section;
pub mod status;

pub use geo::{Coordinates, CoordinatesError};
pub use id::*;
pub use menu::{
    Addon, AddonInput, Item, ItemChanges, ItemError, ItemInput, ItemPatch, NewItem, Section,
};
pub use price::Price;
#[cfg(feature = "postgres")]
pub use rows::{ItemRow, RowError, SectionRow};
pub use section::{SectionName, SectionNameError};
pub use status::*;
