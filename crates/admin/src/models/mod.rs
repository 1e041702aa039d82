//! Wire models for admin.

pub mod api;

pub use api::*;
