//! After10 Core - Shared types library.
//!
//! This crate provides common types used across all After10 components:
//! - `storefront` - Public menu, cart and checkout
//! - `admin` - Menu management API and dashboard client
//! - `cli` - Command-line tools for migrations and menu management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, section names, menu records,
//!   coordinates and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
