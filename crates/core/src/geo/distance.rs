//! Great-circle distance on a spherical earth.

use serde::{Deserialize, Serialize};

use crate::types::GeoPoint;

/// Mean earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Mean earth radius in statute miles.
pub const EARTH_RADIUS_MI: f64 = 3958.8;

const MILES_PER_KM: f64 = EARTH_RADIUS_MI / EARTH_RADIUS_KM;

/// Unit for reporting distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[default]
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
}

impl DistanceUnit {
    #[must_use]
    pub const fn earth_radius(self) -> f64 {
        match self {
            Self::Kilometers => EARTH_RADIUS_KM,
            Self::Miles => EARTH_RADIUS_MI,
        }
    }

    /// Convert a kilometer distance into this unit.
    #[must_use]
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Self::Kilometers => km,
            Self::Miles => km * MILES_PER_KM,
        }
    }

    /// Convert a distance in this unit into kilometers.
    #[must_use]
    pub fn to_km(self, value: f64) -> f64 {
        match self {
            Self::Kilometers => value,
            Self::Miles => value / MILES_PER_KM,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }
}

impl std::fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "km" | "kilometers" => Ok(Self::Kilometers),
            "mi" | "miles" => Ok(Self::Miles),
            other => Err(format!("unknown distance unit: {other}")),
        }
    }
}

/// Central angle between two points, in radians.
fn central_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Haversine distance in kilometers.
///
/// Symmetric, and exactly zero for identical points.
///
/// ```
/// use pressly_core::GeoPoint;
/// use pressly_core::geo::haversine_distance_km;
///
/// let downtown = GeoPoint::new(41.8781, -87.6298).unwrap();
/// let lincoln_park = GeoPoint::new(41.9230, -87.6397).unwrap();
/// let km = haversine_distance_km(downtown, lincoln_park);
/// assert!((5.0..5.3).contains(&km));
/// ```
#[must_use]
pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b)
}

/// Haversine distance in the requested unit.
#[must_use]
pub fn distance(a: GeoPoint, b: GeoPoint, unit: DistanceUnit) -> f64 {
    unit.earth_radius() * central_angle(a, b)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_lincoln_park_fixture() {
        let downtown = point(41.8781, -87.6298);
        let lincoln_park = point(41.9230, -87.6397);
        let km = haversine_distance_km(downtown, lincoln_park);
        assert!((5.0..=5.3).contains(&km), "got {km}");
    }

    #[test]
    fn test_identity_is_zero() {
        for p in [point(0.0, 0.0), point(41.8781, -87.6298), point(-89.9, 179.9)] {
            assert!(haversine_distance_km(p, p) < 1e-6);
        }
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            (point(41.8781, -87.6298), point(40.7128, -74.0060)),
            (point(-33.8688, 151.2093), point(51.5074, -0.1278)),
            (point(0.0, 179.5), point(0.0, -179.5)),
        ];
        for (a, b) in pairs {
            let ab = haversine_distance_km(a, b);
            let ba = haversine_distance_km(b, a);
            assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0), "{ab} vs {ba}");
        }
    }

    #[test]
    fn test_crosses_antimeridian_the_short_way() {
        let km = haversine_distance_km(point(0.0, 179.5), point(0.0, -179.5));
        assert!(km < 112.0, "got {km}");
    }

    #[test]
    fn test_antipodes_are_half_circumference() {
        let km = haversine_distance_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!((km - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_chicago_to_new_york() {
        let km = haversine_distance_km(point(41.8781, -87.6298), point(40.7128, -74.0060));
        assert!((1140.0..1150.0).contains(&km), "got {km}");
    }

    #[test]
    fn test_miles() {
        let a = point(41.8781, -87.6298);
        let b = point(40.7128, -74.0060);
        let km = distance(a, b, DistanceUnit::Kilometers);
        let mi = distance(a, b, DistanceUnit::Miles);
        assert!((DistanceUnit::Miles.from_km(km) - mi).abs() < 1e-6);
        assert!((DistanceUnit::Miles.to_km(mi) - km).abs() < 1e-6);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("KM".parse::<DistanceUnit>().unwrap(), DistanceUnit::Kilometers);
        assert_eq!("miles".parse::<DistanceUnit>().unwrap(), DistanceUnit::Miles);
        assert!("furlongs".parse::<DistanceUnit>().is_err());
    }
}
