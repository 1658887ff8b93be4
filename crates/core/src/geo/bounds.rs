//! Map framing helpers: center, bounding box and zoom.

use serde::{Deserialize, Serialize};

use super::Located;
use crate::types::GeoPoint;

/// Width of the world in pixels at zoom level 0 for 256px tiles.
const GLOBE_WIDTH_PX: f64 = 256.0;

/// Zoom used when the viewport size is unknown.
pub const DEFAULT_ZOOM: f64 = 10.0;

/// Up to this many points the center is a plain coordinate average.
const SIMPLE_AVERAGE_MAX: usize = 3;

/// Axis-aligned box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.lat())
            && (self.west..=self.east).contains(&point.lng())
    }
}

fn valid_points<T: Located>(points: &[T]) -> Vec<GeoPoint> {
    points.iter().filter_map(Located::location).collect()
}

/// Geographic center of the valid points.
///
/// Small sets use the arithmetic mean. Larger sets average unit vectors on
/// the sphere, which behaves across the antimeridian.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn center_point<T: Located>(points: &[T]) -> Option<GeoPoint> {
    let valid = valid_points(points);
    if valid.is_empty() {
        return None;
    }
    let n = valid.len() as f64;

    if valid.len() <= SIMPLE_AVERAGE_MAX {
        let lat = valid.iter().map(GeoPoint::lat).sum::<f64>() / n;
        let lng = valid.iter().map(GeoPoint::lng).sum::<f64>() / n;
        return GeoPoint::new(lat, lng).ok();
    }

    let (mut x, mut y, mut z) = (0.0_f64, 0.0_f64, 0.0_f64);
    for point in &valid {
        let lat = point.lat().to_radians();
        let lng = point.lng().to_radians();
        x += lat.cos() * lng.cos();
        y += lat.cos() * lng.sin();
        z += lat.sin();
    }
    x /= n;
    y /= n;
    z /= n;

    let lng = y.atan2(x);
    let lat = z.atan2(x.hypot(y));
    GeoPoint::new(
        lat.to_degrees().clamp(-90.0, 90.0),
        lng.to_degrees().clamp(-180.0, 180.0),
    )
    .ok()
}

/// Smallest box containing all valid points, grown by `padding_deg` on every side.
#[must_use]
pub fn bounding_box<T: Located>(points: &[T], padding_deg: f64) -> Option<BoundingBox> {
    let valid = valid_points(points);
    let first = valid.first()?;

    let mut bounds = BoundingBox {
        north: first.lat(),
        south: first.lat(),
        east: first.lng(),
        west: first.lng(),
    };
    for point in &valid {
        bounds.north = bounds.north.max(point.lat());
        bounds.south = bounds.south.min(point.lat());
        bounds.east = bounds.east.max(point.lng());
        bounds.west = bounds.west.min(point.lng());
    }

    bounds.north += padding_deg;
    bounds.south -= padding_deg;
    bounds.east += padding_deg;
    bounds.west -= padding_deg;
    Some(bounds)
}

/// Largest zoom at which `bounds` fits in a `width_px` x `height_px` viewport.
///
/// Returns [`DEFAULT_ZOOM`] for an empty viewport.
#[must_use]
pub fn zoom_level(bounds: &BoundingBox, width_px: u32, height_px: u32) -> f64 {
    if width_px == 0 || height_px == 0 {
        return DEFAULT_ZOOM;
    }

    let lat_fraction = (bounds.north - bounds.south) / 180.0;
    let lng_fraction = (bounds.east - bounds.west) / 360.0;

    let lat_zoom = (f64::from(height_px) / GLOBE_WIDTH_PX / lat_fraction).log2();
    let lng_zoom = (f64::from(width_px) / GLOBE_WIDTH_PX / lng_fraction).log2();

    lat_zoom.min(lng_zoom)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::RawGeoPoint;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_center_of_nothing() {
        let empty: Vec<GeoPoint> = Vec::new();
        assert!(center_point(&empty).is_none());
        assert!(center_point(&[RawGeoPoint::default()]).is_none());
    }

    #[test]
    fn test_center_small_set_is_average() {
        let center = center_point(&[point(40.0, -88.0), point(42.0, -86.0)]).unwrap();
        assert!((center.lat() - 41.0).abs() < 1e-12);
        assert!((center.lng() + 87.0).abs() < 1e-12);
    }

    #[test]
    fn test_center_large_set_across_antimeridian() {
        let points = [
            point(1.0, 179.0),
            point(-1.0, 179.0),
            point(1.0, -179.0),
            point(-1.0, -179.0),
        ];
        let center = center_point(&points).unwrap();
        assert!(center.lat().abs() < 1e-9);
        assert!((center.lng().abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box_with_padding() {
        let points = [
            RawGeoPoint::from_degrees(41.8, -87.7),
            RawGeoPoint::default(),
            RawGeoPoint::from_degrees(41.9, -87.6),
        ];
        let bounds = bounding_box(&points, 0.01).unwrap();
        assert!((bounds.north - 41.91).abs() < 1e-9);
        assert!((bounds.south - 41.79).abs() < 1e-9);
        assert!((bounds.east + 87.59).abs() < 1e-9);
        assert!((bounds.west + 87.71).abs() < 1e-9);
        assert!(bounds.contains(point(41.85, -87.65)));
        assert!(!bounds.contains(point(42.5, -87.65)));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(bounding_box::<GeoPoint>(&[], 0.01).is_none());
    }

    #[test]
    fn test_zoom_defaults_without_viewport() {
        let bounds = bounding_box(&[point(41.8, -87.7)], 0.01).unwrap();
        assert!((zoom_level(&bounds, 0, 600) - DEFAULT_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_whole_world_is_zero_at_globe_size() {
        let world = BoundingBox {
            north: 90.0,
            south: -90.0,
            east: 180.0,
            west: -180.0,
        };
        assert!(zoom_level(&world, 256, 256).abs() < 1e-12);
        assert!((zoom_level(&world, 512, 512) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_tighter_box_zooms_in() {
        let city = bounding_box(&[point(41.8, -87.7), point(41.9, -87.6)], 0.0).unwrap();
        let region = bounding_box(&[point(41.0, -88.5), point(43.0, -87.0)], 0.0).unwrap();
        assert!(zoom_level(&city, 800, 600) > zoom_level(&region, 800, 600));
    }
}
