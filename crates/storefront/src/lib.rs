//! After10 storefront library.
//!
//! Menu browsing, the session cart, device location and the checkout
//! handoff. The binary in `main.rs` wires these into an Axum server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod location;
pub mod middleware;
pub mod routes;
pub mod slots;
pub mod state;
