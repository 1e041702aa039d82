//! Menu route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::catalog::MenuView;
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::state::AppState;

/// Menu grouped by section, in-stock items only.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Result<Json<MenuView>> {
    let catalog = state
        .catalog()
        .load(&CatalogRepository::new(state.pool()))
        .await?;
    Ok(Json(catalog.view()))
}
