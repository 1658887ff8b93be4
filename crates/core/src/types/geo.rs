//! Geographic coordinates.
//!
//! [`GeoPoint`] is always valid once constructed. Untrusted input (JSON from
//! the browser, geocoder responses, YAML fixtures) arrives as a
//! [`RawGeoPoint`] and is normalized at the boundary.

use core::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Reasons a coordinate pair is rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum GeoPointError {
    /// Latitude is missing.
    #[error("latitude is missing")]
    MissingLatitude,
    /// Longitude is missing.
    #[error("longitude is missing")]
    MissingLongitude,
    /// A component is NaN or infinite.
    #[error("coordinates must be finite numbers")]
    NotFinite,
    /// Latitude outside [-90, 90].
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude outside [-180, 180].
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    /// The value is not a `{lat, lng}` object at all.
    #[error("location must be an object with lat and lng")]
    Malformed,
}

/// A point on the earth's surface in decimal degrees.
///
/// ## Constraints
///
/// - Both components are finite
/// - Latitude is within `[-90, 90]`
/// - Longitude is within `[-180, 180]`
///
/// ## Examples
///
/// ```
/// use pressly_core::GeoPoint;
///
/// let chicago = GeoPoint::new(41.8781, -87.6298).unwrap();
/// assert_eq!(chicago.lat(), 41.8781);
///
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Validate and build a point.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is not finite or out of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoPointError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(GeoPointError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GeoPointError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        raw.validate()
    }
}

/// A single coordinate as it may appear in loosely-typed input.
///
/// Nominatim returns coordinates as strings; browser state sends numbers.
/// Any other JSON or YAML value is kept as [`RawCoordinate::Other`] and never
/// yields a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
    #[serde(skip_serializing)]
    Other(IgnoredAny),
}

impl RawCoordinate {
    /// Numeric value, if the text form parses.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Other(_) => None,
        }
    }
}

impl From<f64> for RawCoordinate {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// An unvalidated `{ lat, lng }` pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGeoPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<RawCoordinate>,
    #[serde(default, alias = "lon", skip_serializing_if = "Option::is_none")]
    pub lng: Option<RawCoordinate>,
}

impl RawGeoPoint {
    /// Build from numeric components.
    #[must_use]
    pub const fn from_degrees(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(RawCoordinate::Number(lat)),
            lng: Some(RawCoordinate::Number(lng)),
        }
    }

    /// Build from optional numeric components, as received in query strings.
    #[must_use]
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Self {
        Self {
            lat: lat.map(RawCoordinate::Number),
            lng: lng.map(RawCoordinate::Number),
        }
    }

    /// Validate into a [`GeoPoint`], reporting why it failed.
    ///
    /// # Errors
    ///
    /// Returns an error if a component is missing, unparsable, or out of range.
    pub fn validate(&self) -> Result<GeoPoint, GeoPointError> {
        let lat = self.lat.as_ref().ok_or(GeoPointError::MissingLatitude)?;
        let lng = self.lng.as_ref().ok_or(GeoPointError::MissingLongitude)?;
        let lat = lat.value().ok_or(GeoPointError::NotFinite)?;
        let lng = lng.value().ok_or(GeoPointError::NotFinite)?;
        GeoPoint::new(lat, lng)
    }

    /// Validate into a [`GeoPoint`], discarding the reason.
    #[must_use]
    pub fn normalize(&self) -> Option<GeoPoint> {
        self.validate().ok()
    }
}

impl From<GeoPoint> for RawGeoPoint {
    fn from(point: GeoPoint) -> Self {
        Self::from_degrees(point.lat, point.lng)
    }
}

/// Whatever arrived where a location object was expected.
///
/// Strings, arrays, booleans and numbers land in [`LocationInput::Other`], so
/// one malformed record never fails the document around it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Point(RawGeoPoint),
    Other(IgnoredAny),
}

impl LocationInput {
    /// Validate into a [`GeoPoint`], reporting why it failed.
    ///
    /// # Errors
    ///
    /// Returns [`GeoPointError::Malformed`] for a non-object value, otherwise
    /// whatever [`RawGeoPoint::validate`] reports.
    pub fn validate(&self) -> Result<GeoPoint, GeoPointError> {
        match self {
            Self::Point(raw) => raw.validate(),
            Self::Other(_) => Err(GeoPointError::Malformed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_poles_and_antimeridian() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(matches!(
            GeoPoint::new(-90.5, 0.0),
            Err(GeoPointError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, 181.0),
            Err(GeoPointError::LongitudeOutOfRange(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, f64::INFINITY),
            Err(GeoPointError::NotFinite)
        ));
    }

    #[test]
    fn test_zero_coordinates_are_valid() {
        // (0, 0) is a real place; only absence makes a point invalid.
        let raw = RawGeoPoint::from_degrees(0.0, 0.0);
        assert!(raw.normalize().is_some());
    }

    #[test]
    fn test_raw_accepts_numeric_strings() {
        let raw: RawGeoPoint =
            serde_json::from_str(r#"{"lat": "41.8781", "lon": " -87.6298 "}"#).unwrap();
        let point = raw.normalize().unwrap();
        assert!((point.lat() - 41.8781).abs() < 1e-12);
        assert!((point.lng() + 87.6298).abs() < 1e-12);
    }

    #[test]
    fn test_raw_missing_component() {
        let raw: RawGeoPoint = serde_json::from_str(r#"{"lat": 41.0}"#).unwrap();
        assert_eq!(raw.validate(), Err(GeoPointError::MissingLongitude));
        assert!(raw.normalize().is_none());
    }

    #[test]
    fn test_raw_unparsable_text() {
        let raw: RawGeoPoint =
            serde_json::from_str(r#"{"lat": "north", "lng": 1.0}"#).unwrap();
        assert_eq!(raw.validate(), Err(GeoPointError::NotFinite));
    }

    #[test]
    fn test_raw_non_numeric_component_is_kept_as_other() {
        let raw: RawGeoPoint =
            serde_json::from_str(r#"{"lat": true, "lng": [1, 2]}"#).unwrap();
        assert_eq!(raw.lat, Some(RawCoordinate::Other(IgnoredAny)));
        assert_eq!(raw.validate(), Err(GeoPointError::NotFinite));
    }

    #[test]
    fn test_location_input_accepts_any_shape() {
        let text: LocationInput = serde_json::from_str(r#""Chicago""#).unwrap();
        assert_eq!(text.validate(), Err(GeoPointError::Malformed));

        let flag: LocationInput = serde_json::from_str("false").unwrap();
        assert_eq!(flag.validate(), Err(GeoPointError::Malformed));

        let point: LocationInput =
            serde_json::from_str(r#"{"lat": "41.9", "lng": -87.6}"#).unwrap();
        assert!(point.validate().is_ok());
    }

    #[test]
    fn test_geo_point_deserialize_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat": 1.5, "lng": 2.5}"#).unwrap();
        assert_eq!(ok, GeoPoint::new(1.5, 2.5).unwrap());

        let bad = serde_json::from_str::<GeoPoint>(r#"{"lat": 100.0, "lng": 2.5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_geo_point_serializes_as_numbers() {
        let json = serde_json::to_value(GeoPoint::new(1.5, -2.5).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"lat": 1.5, "lng": -2.5}));
    }
}
