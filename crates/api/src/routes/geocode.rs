//! Geocoding proxy routes.
//!
//! Rate limited per client IP because the upstream service is shared.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use pressly_core::RawGeoPoint;
use pressly_core::geo::GeoMatchError;

use crate::error::{AppError, Result};
use crate::middleware::geocode_rate_limiter;
use crate::services::Place;
use crate::state::AppState;

/// Build the geocode router with its rate limiter.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/geocode", get(search))
        .route("/api/geocode/reverse", get(reverse))
        .layer(geocode_rate_limiter())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Forward geocode free-form text.
///
/// # Errors
///
/// Returns 400 for a blank query, 404 when nothing matches, 502 when the
/// geocoder fails.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Place>> {
    state
        .geocoder()
        .search(&query.q)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no place matches {:?}", query.q.trim())))
}

/// Reverse geocode a coordinate.
///
/// # Errors
///
/// Returns 400 for a missing or invalid coordinate, 404 when nothing is
/// there, 502 when the geocoder fails.
pub async fn reverse(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<Place>> {
    let location = RawGeoPoint::from_parts(query.lat, query.lng)
        .normalize()
        .ok_or(GeoMatchError::InvalidOrigin)?;

    state
        .geocoder()
        .reverse(location)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no place at {location}")))
}
