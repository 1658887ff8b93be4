//! Display strings for distances.

use super::distance::DistanceUnit;

const METERS_PER_KM: f64 = 1000.0;
const FEET_PER_MILE: f64 = 5280.0;

/// Format a kilometer distance for display in `unit`.
///
/// Under one unit the value is shown in meters or feet, under ten with one
/// decimal, and above that as a whole number. Non-finite input gives `N/A`.
///
/// ```
/// use pressly_core::geo::{DistanceUnit, format_distance};
///
/// assert_eq!(format_distance(0.85, DistanceUnit::Kilometers), "850 m");
/// assert_eq!(format_distance(5.06, DistanceUnit::Kilometers), "5.1 km");
/// assert_eq!(format_distance(12.4, DistanceUnit::Kilometers), "12 km");
/// ```
#[must_use]
pub fn format_distance(km: f64, unit: DistanceUnit) -> String {
    if !km.is_finite() {
        return "N/A".to_string();
    }

    let value = unit.from_km(km);

    if value < 1.0 {
        let (small, symbol) = match unit {
            DistanceUnit::Kilometers => (value * METERS_PER_KM, "m"),
            DistanceUnit::Miles => (value * FEET_PER_MILE, "ft"),
        };
        format!("{} {symbol}", small.round())
    } else if value < 10.0 {
        format!("{value:.1} {unit}")
    } else {
        format!("{} {unit}", value.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_distances_use_small_units() {
        assert_eq!(format_distance(0.2, DistanceUnit::Kilometers), "200 m");
        assert_eq!(format_distance(0.0, DistanceUnit::Kilometers), "0 m");
        // 0.32 km is just under 0.2 mi
        assert_eq!(format_distance(0.32, DistanceUnit::Miles), "1050 ft");
    }

    #[test]
    fn test_mid_distances_have_one_decimal() {
        assert_eq!(format_distance(1.0, DistanceUnit::Kilometers), "1.0 km");
        assert_eq!(format_distance(9.94, DistanceUnit::Kilometers), "9.9 km");
        assert_eq!(format_distance(5.15, DistanceUnit::Miles), "3.2 mi");
    }

    #[test]
    fn test_long_distances_are_whole() {
        assert_eq!(format_distance(1144.6, DistanceUnit::Kilometers), "1145 km");
        assert_eq!(format_distance(100.0, DistanceUnit::Miles), "62 mi");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_distance(f64::NAN, DistanceUnit::Kilometers), "N/A");
        assert_eq!(format_distance(f64::INFINITY, DistanceUnit::Miles), "N/A");
    }
}
