//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Readiness check (database ping)
//!
//! # Sections (bearer token)
//! GET    /api/sections                  - List sections
//! POST   /api/sections                  - Create a section
//! PUT    /api/sections/{id}             - Rename a section (items follow)
//! PATCH  /api/sections/{id}             - Same as PUT
//! DELETE /api/sections/{id}             - Delete a section and its items
//!
//! # Items (bearer token)
//! GET    /api/items                     - List items
//! POST   /api/items                     - Create an item
//! PUT    /api/items/{id}                - Replace an item
//! PATCH  /api/items/{id}                - Update some fields of an item
//! DELETE /api/items/{id}                - Delete an item
//! DELETE /api/items/section/{sectionId} - Delete every item in a section
//!
//! # Uploads
//! POST   /api/upload                    - Store an image (bearer token)
//! GET    /uploads/{file}                - Locally stored images
//! ```

pub mod items;
pub mod sections;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::middleware::require_api_token;
use crate::services::UPLOADS_PATH;
use crate::state::AppState;

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the section routes router.
pub fn section_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sections::index).post(sections::create))
        .route(
            "/{id}",
            put(sections::rename)
                .patch(sections::rename)
                .delete(sections::delete),
        )
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(items::index).post(items::create))
        .route(
            "/{id}",
            put(items::replace).patch(items::patch).delete(items::delete),
        )
        .route("/section/{section_id}", delete(items::delete_by_section))
}

/// Create the `/api` router. Every route requires the API token.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/sections", section_routes())
        .nest("/items", item_routes())
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route_layer(from_fn_with_state(state.clone(), require_api_token))
}

/// Create all routes for admin.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes(state))
        .nest_service(UPLOADS_PATH, ServeDir::new(&state.config().uploads_dir))
}
