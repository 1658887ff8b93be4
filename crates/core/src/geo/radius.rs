//! Radius filtering and distance ranking.

use super::distance::haversine_distance_km;
use super::{GeoMatchError, Located, Nearby, ZERO_DISTANCE_KM};
use crate::types::GeoPoint;

/// Great-circle distance with sub-millimeter results reported as zero.
#[must_use]
pub fn measure_km(origin: GeoPoint, point: GeoPoint) -> f64 {
    let distance_km = haversine_distance_km(origin, point);
    if distance_km < ZERO_DISTANCE_KM {
        0.0
    } else {
        distance_km
    }
}

/// Whether a measured distance lies inside `radius_km`, inclusive.
///
/// A negative or NaN radius admits nothing.
#[must_use]
pub const fn in_radius(distance_km: f64, radius_km: f64) -> bool {
    distance_km <= radius_km
}

/// Keep the candidates within `radius_km` of `origin`, attaching distances.
///
/// Candidates without a usable location are skipped. Output follows input
/// order; call [`rank_by_distance`] to sort. A negative or NaN radius matches
/// nothing, and a zero radius matches only points at the origin.
///
/// # Errors
///
/// Returns [`GeoMatchError::InvalidOrigin`] if `origin` has no usable
/// coordinates.
pub fn within_radius<T, I>(
    origin: &impl Located,
    candidates: I,
    radius_km: f64,
) -> Result<Vec<Nearby<T>>, GeoMatchError>
where
    I: IntoIterator<Item = T>,
    T: Located,
{
    let origin = origin.location().ok_or(GeoMatchError::InvalidOrigin)?;

    let matches = candidates
        .into_iter()
        .filter_map(|item| {
            let distance_km = measure_km(origin, item.location()?);
            in_radius(distance_km, radius_km).then_some(Nearby { item, distance_km })
        })
        .collect();

    Ok(matches)
}

/// Sort ascending by distance.
///
/// The sort is stable: records at equal distance keep their input order.
#[must_use]
pub fn rank_by_distance<T>(mut results: Vec<Nearby<T>>) -> Vec<Nearby<T>> {
    results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    results
}

/// Filter, rank and optionally truncate in one step.
///
/// # Errors
///
/// Returns [`GeoMatchError::InvalidOrigin`] if `origin` has no usable
/// coordinates.
pub fn search_nearby<T, I>(
    origin: &impl Located,
    candidates: I,
    radius_km: f64,
    limit: Option<usize>,
) -> Result<Vec<Nearby<T>>, GeoMatchError>
where
    I: IntoIterator<Item = T>,
    T: Located,
{
    let mut ranked = rank_by_distance(within_radius(origin, candidates, radius_km)?);
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    Ok(ranked)
}

/// Whether `point` lies within `radius_km` of `center`.
///
/// Invalid inputs on either side yield `false`.
#[must_use]
pub fn is_within_radius(point: &impl Located, center: &impl Located, radius_km: f64) -> bool {
    match (point.location(), center.location()) {
        (Some(point), Some(center)) => in_radius(measure_km(center, point), radius_km),
        _ => false,
    }
}
