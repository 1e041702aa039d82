//! Section route handlers.

use after10_core::{SectionId, SectionName};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::db::SectionRepository;
use crate::error::Result;
use crate::models::{SectionDeleteEnvelope, SectionEnvelope, SectionInput, SectionsEnvelope};
use crate::state::AppState;

/// List all sections.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<SectionsEnvelope>> {
    let sections = SectionRepository::new(state.pool()).list().await?;
    Ok(Json(SectionsEnvelope {
        sections,
        success: true,
    }))
}

/// Create a section.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<SectionInput>,
) -> Result<(StatusCode, Json<SectionEnvelope>)> {
    let name = SectionName::parse(&input.name)?;
    let section = SectionRepository::new(state.pool()).create(&name).await?;
    Ok((StatusCode::CREATED, Json(SectionEnvelope { section })))
}

/// Rename a section. Its items follow the new name.
#[instrument(skip(state))]
pub async fn rename(
    State(state): State<AppState>,
    Path(id): Path<SectionId>,
    Json(input): Json<SectionInput>,
) -> Result<Json<SectionEnvelope>> {
    let name = SectionName::parse(&input.name)?;
    let section = SectionRepository::new(state.pool())
        .rename(id, &name)
        .await?;
    Ok(Json(SectionEnvelope { section }))
}

/// Delete a section and all of its items.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<SectionId>,
) -> Result<Json<SectionDeleteEnvelope>> {
    let deletion = SectionRepository::new(state.pool())
        .delete_cascade(id)
        .await?;
    Ok(Json(SectionDeleteEnvelope::success(
        "Section and associated items deleted successfully",
        deletion,
    )))
}
