//! After10 Admin library.
//!
//! This crate provides the admin functionality as a library,
//! allowing it to be tested and reused by the CLI.
//!
//! # Components
//!
//! - [`routes`] - Bearer-token JSON API for sections, items and uploads
//! - [`db`] - Menu repositories over `PostgreSQL`
//! - [`client`] - HTTP client for a running admin server
//! - [`dashboard`] - Local menu state kept in step with the server
//!
//! # Security
//!
//! Every `/api` route requires `ADMIN_API_TOKEN`. Bind to localhost or a
//! private network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
