//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//! GET    /health/ready           - Readiness check (database ping)
//!
//! # Menu
//! GET    /api/menu               - In-stock items grouped by section
//!
//! # Cart (session)
//! GET    /api/cart               - Current cart
//! POST   /api/cart/add           - Add an item with add-ons
//! POST   /api/cart/update        - Set a line's quantity (0 removes)
//! POST   /api/cart/remove        - Remove a line
//! POST   /api/cart/clear         - Empty the cart
//!
//! # Location (session)
//! GET    /api/location           - Current location state
//! POST   /api/location/acquire   - Browser-reported position outcome
//! POST   /api/location/address   - Pick coordinates manually
//! DELETE /api/location           - Reset to pending
//!
//! # Checkout
//! GET    /api/checkout/form      - Form pre-filled with defaults
//! POST   /api/checkout           - Build the order and messaging link
//! ```

pub mod cart;
pub mod checkout;
pub mod location;
pub mod menu;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the location routes router.
pub fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(location::show).delete(location::reset))
        .route("/acquire", post(location::acquire))
        .route("/address", post(location::set_address))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::submit))
        .route("/form", get(checkout::form))
}

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/menu", get(menu::show))
        .nest("/cart", cart_routes())
        .nest("/location", location_routes())
        .nest("/checkout", checkout_routes())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}
