//! Reverse geocoding against a Nominatim-compatible service.

use std::future::Future;
use std::time::Duration;

use after10_core::Coordinates;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::GeocoderConfig;

/// Address shown when the lookup succeeded but found nothing.
pub const ADDRESS_NOT_FOUND: &str = "Address not found";

/// Address shown when the lookup itself failed.
pub const ADDRESS_UNAVAILABLE: &str = "Address unavailable";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Errors talking to the geocoding service.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid geocoder URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("geocoder returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Structured address parts returned by a reverse lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddressComponents {
    pub house_number: Option<String>,
    pub building: Option<String>,
    pub road: Option<String>,
    pub amenity: Option<String>,
    pub shop: Option<String>,
    pub neighbourhood: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// A service that turns coordinates into address components.
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address at `coords`.
    ///
    /// `Ok(None)` means the service answered but had no address.
    fn reverse(
        &self,
        coords: Coordinates,
    ) -> impl Future<Output = Result<Option<AddressComponents>, GeocodeError>> + Send;
}

/// Result of resolving coordinates to display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressLookup {
    Found(String),
    NotFound,
    Unavailable,
}

impl AddressLookup {
    /// Text to display for this outcome.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Found(address) => address,
            Self::NotFound => ADDRESS_NOT_FOUND,
            Self::Unavailable => ADDRESS_UNAVAILABLE,
        }
    }
}

/// Resolve coordinates to an address, never failing.
pub async fn lookup_address<G: ReverseGeocoder>(
    geocoder: &G,
    coords: Coordinates,
) -> AddressLookup {
    match geocoder.reverse(coords).await {
        Ok(Some(components)) => {
            let address = compose_address(&components);
            if address.is_empty() {
                AddressLookup::NotFound
            } else {
                AddressLookup::Found(address)
            }
        }
        Ok(None) => AddressLookup::NotFound,
        Err(e) => {
            tracing::warn!(error = %e, "Reverse geocoding failed");
            AddressLookup::Unavailable
        }
    }
}

/// Join address parts from most to least specific.
///
/// Order: house number, building (when it differs from the house number),
/// road, "Near" the amenity or shop, neighbourhood or suburb, city, state,
/// country. Blank parts are skipped.
#[must_use]
pub fn compose_address(c: &AddressComponents) -> String {
    fn present(value: Option<&String>) -> Option<&str> {
        value.map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    let mut parts: Vec<String> = Vec::new();

    let house_number = present(c.house_number.as_ref());
    if let Some(number) = house_number {
        parts.push(number.to_string());
    }
    if let Some(building) = present(c.building.as_ref())
        && Some(building) != house_number
    {
        parts.push(building.to_string());
    }
    if let Some(road) = present(c.road.as_ref()) {
        parts.push(road.to_string());
    }
    if let Some(landmark) = present(c.amenity.as_ref()).or_else(|| present(c.shop.as_ref())) {
        parts.push(format!("Near {landmark}"));
    }
    if let Some(area) =
        present(c.neighbourhood.as_ref()).or_else(|| present(c.suburb.as_ref()))
    {
        parts.push(area.to_string());
    }
    if let Some(city) = present(c.city.as_ref())
        .or_else(|| present(c.town.as_ref()))
        .or_else(|| present(c.village.as_ref()))
    {
        parts.push(city.to_string());
    }
    if let Some(state) = present(c.state.as_ref()) {
        parts.push(state.to_string());
    }
    if let Some(country) = present(c.country.as_ref()) {
        parts.push(country.to_string());
    }

    parts.dedup();
    parts
        .iter()
        .map(|p| p.trim_matches(|ch: char| ch == ',' || ch.is_whitespace()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<AddressComponents>,
}

/// Client for the Nominatim `/reverse` endpoint.
#[derive(Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: Url,
}

impl NominatimClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn reverse_url(&self, coords: Coordinates) -> Result<Url, GeocodeError> {
        let mut url = self.base_url.join("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coords.lat.to_string())
            .append_pair("lon", &coords.lng.to_string())
            .append_pair("addressdetails", "1")
            .append_pair("namedetails", "1")
            .append_pair("extratags", "1");
        Ok(url)
    }
}

impl ReverseGeocoder for NominatimClient {
    #[instrument(skip(self), fields(lat = coords.lat, lng = coords.lng))]
    async fn reverse(&self, coords: Coordinates) -> Result<Option<AddressComponents>, GeocodeError> {
        let url = self.reverse_url(coords)?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }

        let body: NominatimResponse = response.json().await?;
        debug!(found = body.address.is_some(), "Reverse geocode complete");
        Ok(body.address)
    }
}
