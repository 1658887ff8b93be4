//! Offline lookups: levels, distances and nearby producers.
//!
//! These commands need no database. Reports are built as strings so they
//! can be checked without capturing stdout.

use std::fmt::Write as _;
use std::path::Path;

use pressly_core::geo::{DistanceUnit, GeoMatchError, distance, format_distance, search_nearby};
use pressly_core::level::LevelSummary;
use pressly_core::{GeoPoint, GeoPointError, Producer};

use super::seed::load_producers;

/// Options for [`nearby`].
#[derive(Debug, Clone, Copy)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
    pub unit: DistanceUnit,
    pub limit: Option<usize>,
}

/// Print level, features and progress for an order count.
pub fn level(order_count: i64) {
    #[allow(clippy::print_stdout)]
    {
        print!("{}", level_report(order_count));
    }
}

/// Print the distance between two `(lat, lng)` points.
///
/// # Errors
///
/// Returns an error if either point is out of range.
pub fn distance_between(
    from: (f64, f64),
    to: (f64, f64),
    unit: DistanceUnit,
) -> Result<(), GeoPointError> {
    let report = distance_report(from, to, unit)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{report}");
    }
    Ok(())
}

/// Print producers from a YAML file within a radius, nearest first.
///
/// # Errors
///
/// Returns an error if the file does not load or the origin is invalid.
pub async fn nearby(file: &Path, query: &NearbyQuery) -> Result<(), Box<dyn std::error::Error>> {
    let producers = load_producers(file).await?;
    let report = nearby_report(producers, query)?;
    #[allow(clippy::print_stdout)]
    {
        print!("{report}");
    }
    Ok(())
}

/// Multi-line level summary.
#[must_use]
pub fn level_report(order_count: i64) -> String {
    let summary = LevelSummary::for_count(order_count);
    let progress = summary.progress;

    let mut out = String::new();
    let _ = writeln!(out, "Level {}", summary.level);
    let _ = writeln!(out, "Orders: {}", progress.current_orders);
    let _ = writeln!(out, "Features:");
    for (feature, enabled) in summary.features.iter() {
        let mark = if enabled { 'x' } else { ' ' };
        let _ = writeln!(out, "  [{mark}] {feature}");
    }
    match progress.next_level {
        Some(next) => {
            let _ = writeln!(
                out,
                "Progress: {:.0}% toward level {next}, {} more order(s)",
                progress.percent, progress.orders_remaining
            );
        }
        None => {
            let _ = writeln!(out, "Progress: top level reached");
        }
    }
    let eligibility = if summary.producer_mode_eligible {
        "eligible"
    } else {
        "not eligible"
    };
    let _ = writeln!(out, "Producer mode: {eligibility}");
    out
}

/// One-line formatted distance.
///
/// # Errors
///
/// Returns an error if either point is out of range.
pub fn distance_report(
    from: (f64, f64),
    to: (f64, f64),
    unit: DistanceUnit,
) -> Result<String, GeoPointError> {
    let a = GeoPoint::new(from.0, from.1)?;
    let b = GeoPoint::new(to.0, to.1)?;
    let km = distance(a, b, DistanceUnit::Kilometers);
    Ok(format!(
        "{} ({:.3} {unit})",
        format_distance(km, unit),
        distance(a, b, unit)
    ))
}

/// Ranked listing of producers within the query radius.
///
/// # Errors
///
/// Returns [`GeoMatchError::InvalidOrigin`] if the query point is invalid.
pub fn nearby_report(
    producers: Vec<Producer>,
    query: &NearbyQuery,
) -> Result<String, GeoMatchError> {
    let origin = GeoPoint::new(query.lat, query.lng).map_err(|_| GeoMatchError::InvalidOrigin)?;
    let found = search_nearby(&origin, producers, query.radius_km, query.limit)?;

    let mut out = String::new();
    if found.is_empty() {
        let _ = writeln!(out, "No producers within {} km of {origin}", query.radius_km);
        return Ok(out);
    }

    for (rank, hit) in found.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} (#{}) - {}",
            rank + 1,
            hit.item.name,
            hit.item.id,
            format_distance(hit.distance_km, query.unit)
        );
    }
    Ok(out)
}
