//! Geographic coordinates.

use serde::{Deserialize, Serialize};

/// Errors produced when validating coordinates.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CoordinatesError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

/// A WGS84 latitude/longitude pair.
///
/// Deserialization also accepts `lon` for the longitude, which is what some
/// geocoders and older stored snapshots use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
}

impl Coordinates {
    /// Create validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is out of range or not finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinatesError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinatesError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinatesError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Re-check a value that came in through deserialization.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is out of range.
    pub fn validated(self) -> Result<Self, CoordinatesError> {
        Self::new(self.lat, self.lng)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_valid() {
        let c = Coordinates::new(25.3463, 74.6364).unwrap();
        assert!((c.lat - 25.3463).abs() < f64::EPSILON);
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            Coordinates::new(91.0, 0.0),
            Err(CoordinatesError::Latitude(_))
        ));
        assert!(matches!(
            Coordinates::new(0.0, -181.0),
            Err(CoordinatesError::Longitude(_))
        ));
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_deserialize_lon_alias() {
        let c: Coordinates = serde_json::from_str(r#"{"lat": 1.5, "lon": 2.5}"#).unwrap();
        assert!((c.lng - 2.5).abs() < f64::EPSILON);
    }
}
