//! Location resolver.
//!
//! Tracks whether the visitor has shared their device position, the
//! coordinates we got, and the address those coordinates resolve to. The whole
//! state lives in the visitor's `location` slot so a returning visitor does
//! not have to share their position again.
//!
//! # State machine
//!
//! ```text
//! pending --acquired--> granted
//! pending --failed----> denied
//! granted|denied --reset--> pending
//! ```
//!
//! A failed re-acquisition from `granted` keeps the previous fix. Once
//! `denied`, acquisition is refused until the visitor resets.

pub mod geocode;

use std::future::Future;
use std::time::Duration;

use after10_core::{Coordinates, CoordinatesError, LocationStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::slots::{SlotError, SlotStore};

pub use geocode::{
    ADDRESS_NOT_FOUND, ADDRESS_UNAVAILABLE, AddressComponents, AddressLookup, GeocodeError,
    NominatimClient, ReverseGeocoder, compose_address, lookup_address,
};

/// Slot name holding the location snapshot.
pub const LOCATION_SLOT: &str = "location";

/// Options passed to the position source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the source may return. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(5),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Why a position could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timed out waiting for a position")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
}

impl PositionError {
    /// Map a browser `GeolocationPositionError.code`.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }
}

/// Something that can produce the device position once.
pub trait PositionSource: Send + Sync {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, PositionError>> + Send;
}

/// A position already obtained by the browser and reported to the server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedPosition(pub Result<Coordinates, PositionError>);

impl PositionSource for ReportedPosition {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        self.0
    }
}

/// Errors returned by resolver operations.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location access was denied; reset to try again")]
    Denied,

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("invalid coordinates: {0}")]
    Coordinates(#[from] CoordinatesError),

    #[error("failed to persist location: {0}")]
    Slot(#[from] SlotError),
}

/// Persisted location selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationState {
    /// Device position from the last successful acquisition.
    pub coordinates: Option<Coordinates>,
    /// Position the visitor picked, which may differ from the device's.
    pub selected_coordinates: Option<Coordinates>,
    pub status: LocationStatus,
    #[serde(default)]
    pub resolved_address: String,
}

impl LocationState {
    /// The resolved address, unless it is empty or a lookup sentinel.
    #[must_use]
    pub fn usable_address(&self) -> Option<&str> {
        let address = self.resolved_address.trim();
        if address.is_empty() || address == ADDRESS_NOT_FOUND || address == ADDRESS_UNAVAILABLE {
            None
        } else {
            Some(address)
        }
    }

    fn apply_lookup(&mut self, lookup: &AddressLookup) {
        // A failed lookup should not wipe an address we already had.
        if matches!(lookup, AddressLookup::Unavailable) && !self.resolved_address.is_empty() {
            return;
        }
        self.resolved_address = lookup.text().to_string();
    }

    /// Repair snapshots that break the `granted` invariant.
    fn normalized(mut self) -> Self {
        if self.status == LocationStatus::Granted && self.coordinates.is_none() {
            self.status = LocationStatus::Pending;
        }
        if self.selected_coordinates.is_none() {
            self.selected_coordinates = self.coordinates;
        }
        self
    }
}

/// Location state for one visitor.
pub struct LocationResolver<'g, S, G> {
    slots: S,
    geocoder: &'g G,
    options: PositionOptions,
    state: LocationState,
    loading: bool,
}

impl<'g, S: SlotStore, G: ReverseGeocoder> LocationResolver<'g, S, G> {
    /// Construct a resolver from whatever snapshot the slot holds.
    pub async fn load(slots: S, geocoder: &'g G) -> Self {
        let mut resolver = Self {
            slots,
            geocoder,
            options: PositionOptions::default(),
            state: LocationState::default(),
            loading: true,
        };

        resolver.state = match resolver.slots.load(LOCATION_SLOT).await {
            Ok(Some(value)) => match serde_json::from_value::<LocationState>(value) {
                Ok(state) => state.normalized(),
                Err(e) => {
                    warn!(error = %e, "Discarding corrupt location snapshot");
                    LocationState::default()
                }
            },
            Ok(None) => LocationState::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read location snapshot");
                LocationState::default()
            }
        };
        resolver.loading = false;
        resolver
    }

    /// Override the options passed to position sources.
    #[must_use]
    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    /// Acquire the device position and resolve its address.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Denied`] without asking the source when access
    /// was already denied, the [`PositionError`] when acquisition fails, or
    /// [`LocationError::Slot`] when the new state cannot be stored.
    pub async fn request_location<P: PositionSource>(
        &mut self,
        source: &P,
    ) -> Result<&LocationState, LocationError> {
        if self.state.status == LocationStatus::Denied {
            return Err(LocationError::Denied);
        }

        let outcome = match tokio::time::timeout(
            self.options.timeout,
            source.current_position(&self.options),
        )
        .await
        {
            Ok(Ok(coords)) => coords
                .validated()
                .map_err(|_| PositionError::PositionUnavailable),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(PositionError::Timeout),
        };

        match outcome {
            Ok(coords) => {
                let lookup = lookup_address(self.geocoder, coords).await;
                self.state.apply_lookup(&lookup);
                self.state.coordinates = Some(coords);
                self.state.selected_coordinates = Some(coords);
                self.state.status = LocationStatus::Granted;
                self.persist().await?;
                info!("Location granted");
                Ok(&self.state)
            }
            Err(e) if self.state.status == LocationStatus::Granted => {
                warn!(error = %e, "Re-acquisition failed, keeping previous location");
                Err(e.into())
            }
            Err(e) => {
                self.state.status = LocationStatus::Denied;
                self.state.coordinates = None;
                self.state.selected_coordinates = None;
                self.persist().await?;
                info!(error = %e, "Location denied");
                Err(e.into())
            }
        }
    }

    /// Resolve and store the address for coordinates the visitor picked.
    ///
    /// Leaves the permission status alone.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range coordinates or when the state cannot
    /// be stored.
    pub async fn set_location_with_address(
        &mut self,
        coords: Coordinates,
    ) -> Result<&LocationState, LocationError> {
        let coords = coords.validated()?;
        let lookup = lookup_address(self.geocoder, coords).await;
        self.state.apply_lookup(&lookup);
        self.state.selected_coordinates = Some(coords);
        self.persist().await?;
        Ok(&self.state)
    }

    /// Forget everything and go back to `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Slot`] if the snapshot could not be erased.
    pub async fn reset(&mut self) -> Result<(), LocationError> {
        self.state = LocationState::default();
        self.slots.erase(LOCATION_SLOT).await?;
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &LocationState {
        &self.state
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    async fn persist(&self) -> Result<(), LocationError> {
        let value = serde_json::to_value(&self.state)
            .map_err(|e| SlotError::Unavailable(format!("location serialization failed: {e}")))?;
        self.slots.save(LOCATION_SLOT, value).await?;
        Ok(())
    }
}
