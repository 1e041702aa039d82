//! Location route handlers.
//!
//! The browser performs the one-shot geolocation call itself and reports the
//! outcome to `POST /api/location/acquire`; the resolver then applies the
//! same state transitions it would for any other position source.

use after10_core::Coordinates;
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::location::{
    LocationResolver, LocationState, NominatimClient, PositionError, ReportedPosition,
};
use crate::slots::SessionSlots;
use crate::state::AppState;

/// Outcome of the browser's position request.
///
/// Either `coordinates`, or an `error` name, or the raw browser `errorCode`.
/// A report with none of them means the browser has no geolocation support.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquireReport {
    pub coordinates: Option<Coordinates>,
    pub error: Option<PositionError>,
    pub error_code: Option<u16>,
}

impl From<AcquireReport> for ReportedPosition {
    fn from(report: AcquireReport) -> Self {
        let outcome = match (report.coordinates, report.error, report.error_code) {
            (Some(coords), _, _) => Ok(coords),
            (None, Some(error), _) => Err(error),
            (None, None, Some(code)) => Err(PositionError::from_code(code)),
            (None, None, None) => Err(PositionError::Unsupported),
        };
        Self(outcome)
    }
}

async fn open_resolver(
    state: &AppState,
    session: Session,
) -> LocationResolver<'_, SessionSlots, NominatimClient> {
    LocationResolver::load(SessionSlots::new(session), state.geocoder()).await
}

/// Current location selection.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<LocationState> {
    let resolver = open_resolver(&state, session).await;
    Json(resolver.state().clone())
}

/// Apply the browser's position report.
#[instrument(skip(state, session))]
pub async fn acquire(
    State(state): State<AppState>,
    session: Session,
    Json(report): Json<AcquireReport>,
) -> Result<Json<LocationState>> {
    let mut resolver = open_resolver(&state, session).await;
    let source = ReportedPosition::from(report);
    let location = resolver.request_location(&source).await?;
    Ok(Json(location.clone()))
}

/// Use coordinates the visitor picked on the map.
#[instrument(skip(state, session))]
pub async fn set_address(
    State(state): State<AppState>,
    session: Session,
    Json(coords): Json<Coordinates>,
) -> Result<Json<LocationState>> {
    let mut resolver = open_resolver(&state, session).await;
    let location = resolver.set_location_with_address(coords).await?;
    Ok(Json(location.clone()))
}

/// Forget the location and go back to `pending`.
#[instrument(skip(state, session))]
pub async fn reset(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    let mut resolver = open_resolver(&state, session).await;
    resolver.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
