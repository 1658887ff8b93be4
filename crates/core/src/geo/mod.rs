//! Proximity search over located records.
//!
//! - [`distance`] - Great-circle distance (haversine)
//! - [`radius`] - Radius filtering and distance ranking
//! - [`bounds`] - Center points, bounding boxes and map zoom fitting
//! - [`format`] - Human-readable distance strings
//!
//! Candidates with unusable coordinates are skipped, never reported as
//! errors. Only an unusable origin fails a query.

pub mod bounds;
pub mod distance;
pub mod format;
pub mod radius;

use serde::{Deserialize, Serialize};

use crate::types::{GeoPoint, Producer, RawGeoPoint};

pub use bounds::{BoundingBox, DEFAULT_ZOOM, bounding_box, center_point, zoom_level};
pub use distance::{DistanceUnit, distance, haversine_distance_km};
pub use format::format_distance;
pub use radius::{
    in_radius, is_within_radius, measure_km, rank_by_distance, search_nearby, within_radius,
};

/// Distances below this many kilometers are treated as zero.
pub const ZERO_DISTANCE_KM: f64 = 1e-6;

/// Errors from proximity queries.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoMatchError {
    /// The origin has no usable coordinates, so there is nothing to measure from.
    #[error("origin must have valid latitude and longitude")]
    InvalidOrigin,
}

/// Anything that may carry a position.
pub trait Located {
    /// The validated position, or `None` when coordinates are missing or invalid.
    fn location(&self) -> Option<GeoPoint>;
}

impl Located for GeoPoint {
    fn location(&self) -> Option<GeoPoint> {
        Some(*self)
    }
}

impl Located for RawGeoPoint {
    fn location(&self) -> Option<GeoPoint> {
        self.normalize()
    }
}

impl Located for Producer {
    fn location(&self) -> Option<GeoPoint> {
        self.location
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn location(&self) -> Option<GeoPoint> {
        (**self).location()
    }
}

impl<T: Located> Located for Option<T> {
    fn location(&self) -> Option<GeoPoint> {
        self.as_ref().and_then(Located::location)
    }
}

/// A record paired with its distance from the query origin.
///
/// The distance lives only on this wrapper; it is never written back to the
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nearby<T> {
    #[serde(flatten)]
    pub item: T,
    pub distance_km: f64,
}

impl<T> Nearby<T> {
    /// The distance expressed in `unit`.
    #[must_use]
    pub fn distance_in(&self, unit: DistanceUnit) -> f64 {
        unit.from_km(self.distance_km)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Nearby<U> {
        Nearby {
            item: f(self.item),
            distance_km: self.distance_km,
        }
    }
}
