//! Producer handlers: listing, upserts, proximity search, map framing and
//! match scoring.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pressly_core::geo::{
    BoundingBox, DEFAULT_ZOOM, DistanceUnit, GeoMatchError, Nearby, bounding_box, center_point,
    format_distance, rank_by_distance, within_radius, zoom_level,
};
use pressly_core::matching::{MatchOptions, ProducerMatch, score_producers};
use pressly_core::store::Repository;
use pressly_core::{GeoPoint, LocationInput, Producer, ProducerId, RawGeoPoint};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the producers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/producers", get(index))
        .route("/api/producers/nearby", get(nearby))
        .route("/api/producers/matches", get(matches))
        .route("/api/producers/map", get(map_view))
        .route("/api/producers/{id}", get(show).put(upsert))
}

/// Body for creating or replacing a producer.
#[derive(Debug, Deserialize)]
pub struct UpsertProducerRequest {
    pub name: String,
    /// Missing or invalid coordinates store the producer without a location.
    #[serde(default)]
    pub location: Option<LocationInput>,
    #[serde(default)]
    pub availability_percent: Option<u8>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Query for `/api/producers/nearby`.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub unit: DistanceUnit,
    pub limit: Option<usize>,
}

/// Query for `/api/producers/map`.
#[derive(Debug, Deserialize)]
pub struct MapQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    /// Viewport size in pixels. Zero or missing gives the default zoom.
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Query for `/api/producers/matches`.
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub min_score: Option<f64>,
    pub limit: Option<usize>,
    /// Comma-separated capabilities the job needs, e.g. `letterpress,foil`.
    #[serde(default)]
    pub capabilities: String,
}

impl MatchQuery {
    fn required_capabilities(&self) -> Vec<String> {
        self.capabilities
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

/// A producer found by proximity search, with its distance from the origin.
#[derive(Debug, Serialize)]
pub struct NearbyProducer {
    #[serde(flatten)]
    pub producer: Producer,
    pub distance_km: f64,
    /// Distance in the requested unit.
    pub distance: f64,
    pub unit: DistanceUnit,
    /// Display string such as `850 m` or `3.1 mi`.
    pub distance_label: String,
}

/// Viewport framing the producers around an origin.
#[derive(Debug, Serialize)]
pub struct MapView {
    pub center: GeoPoint,
    /// `None` when no producer is in range.
    pub bounds: Option<BoundingBox>,
    pub zoom: f64,
    pub producers: Vec<NearbyProducer>,
}

/// Padding around framed producers, in degrees.
const MAP_PADDING_DEG: f64 = 0.01;

impl NearbyProducer {
    fn new(found: Nearby<Producer>, unit: DistanceUnit) -> Self {
        Self {
            distance: found.distance_in(unit),
            distance_label: format_distance(found.distance_km, unit),
            distance_km: found.distance_km,
            unit,
            producer: found.item,
        }
    }
}

/// List all producers, located or not.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Producer>>> {
    let producers = Repository::<Producer>::list(state.store()).await?;
    Ok(Json(producers))
}

/// Show one producer.
///
/// # Errors
///
/// Returns `NotFound` for an unknown id.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProducerId>,
) -> Result<Json<Producer>> {
    let producer = Repository::<Producer>::get(state.store(), id).await?;
    producer
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("producer {id}")))
}

/// Create or replace a producer.
///
/// # Errors
///
/// Returns `BadRequest` for a blank name, or a store error.
#[instrument(skip(state, body), fields(producer_id = %id))]
pub async fn upsert(
    State(state): State<AppState>,
    Path(id): Path<ProducerId>,
    Json(body): Json<UpsertProducerRequest>,
) -> Result<(StatusCode, Json<Producer>)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let location = match &body.location {
        Some(raw) => match raw.validate() {
            Ok(point) => Some(point),
            Err(e) => {
                tracing::warn!(error = %e, "Storing producer without location");
                None
            }
        },
        None => None,
    };

    let mut producer = Producer::new(id, name, location);
    if let Some(percent) = body.availability_percent {
        producer = producer.with_availability(percent);
    }
    if let Some(rating) = body.rating {
        producer = producer.with_rating(rating, body.review_count);
    } else {
        producer.review_count = body.review_count;
    }
    producer.capabilities = body.capabilities;

    let existing = Repository::<Producer>::get(state.store(), id).await?;
    let status = if existing.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    state.store().put(producer.clone()).await?;

    tracing::info!(located = producer.location.is_some(), "Producer saved");
    Ok((status, Json(producer)))
}

/// Producers within a radius of the origin, nearest first.
///
/// The radius defaults to the configured value.
///
/// # Errors
///
/// Returns a 400 error if the origin is missing or invalid.
#[instrument(skip(state))]
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyProducer>>> {
    let origin = RawGeoPoint::from_parts(query.lat, query.lng);
    let radius_km = query.radius_km.unwrap_or(state.config().default_radius_km);

    let producers = Repository::<Producer>::list(state.store()).await?;
    let mut found = rank_by_distance(within_radius(&origin, producers, radius_km)?);
    if let Some(limit) = query.limit {
        found.truncate(limit);
    }

    tracing::debug!(radius_km, results = found.len(), "Nearby search");
    Ok(Json(
        found
            .into_iter()
            .map(|n| NearbyProducer::new(n, query.unit))
            .collect(),
    ))
}

/// Center, bounds and zoom that frame the producers near an origin.
///
/// With nothing in range the map centers on the origin at the default zoom.
///
/// # Errors
///
/// Returns a 400 error if the origin is missing or invalid.
#[instrument(skip(state))]
pub async fn map_view(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<Json<MapView>> {
    let origin = RawGeoPoint::from_parts(query.lat, query.lng);
    let radius_km = query.radius_km.unwrap_or(state.config().default_radius_km);

    let producers = Repository::<Producer>::list(state.store()).await?;
    let found = rank_by_distance(within_radius(&origin, producers, radius_km)?);
    let points: Vec<&Producer> = found.iter().map(|n| &n.item).collect();

    let bounds = bounding_box(&points, MAP_PADDING_DEG);
    let view = MapView {
        center: center_point(&points)
            .or_else(|| origin.normalize())
            .ok_or(GeoMatchError::InvalidOrigin)?,
        zoom: bounds.map_or(DEFAULT_ZOOM, |b| zoom_level(&b, query.width, query.height)),
        bounds,
        producers: found
            .into_iter()
            .map(|n| NearbyProducer::new(n, DistanceUnit::default()))
            .collect(),
    };
    Ok(Json(view))
}

/// Producers scored against the origin, best first.
///
/// # Errors
///
/// Returns a 400 error if the origin is missing or invalid.
#[instrument(skip(state))]
pub async fn matches(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Vec<ProducerMatch>>> {
    let origin = RawGeoPoint::from_parts(query.lat, query.lng);
    let options = MatchOptions {
        required_capabilities: query.required_capabilities(),
        min_score: query.min_score.unwrap_or(0.0),
        max_distance_km: query.radius_km,
        limit: query.limit,
        ..MatchOptions::default()
    };

    let producers = Repository::<Producer>::list(state.store()).await?;
    Ok(Json(score_producers(&origin, producers, &options)?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use pressly_core::GeoPoint;
    use pressly_core::store::MemoryStore;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;

    fn point(lat: f64, lng: f64) -> Option<GeoPoint> {
        Some(GeoPoint::new(lat, lng).unwrap())
    }

    fn chicago() -> MemoryStore {
        MemoryStore::seeded(
            [],
            [
                Producer::new(ProducerId::new(1), "Lincoln Park Printing", point(41.9230, -87.6397))
                    .with_rating(4.8, 40),
                Producer::new(ProducerId::new(2), "Loop Letterpress", point(41.8800, -87.6300))
                    .with_availability(20),
                Producer::new(ProducerId::new(3), "No Address Yet", None),
                Producer::new(ProducerId::new(4), "Milwaukee Big Format", point(43.0389, -87.9065)),
            ],
        )
        .unwrap()
    }

    fn app(store: MemoryStore) -> Router {
        let state = AppState::new(ApiConfig::local(), store).unwrap();
        router().with_state(state)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn ids(body: &Value) -> Vec<i64> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_index_includes_unlocated_producers() {
        let (status, body) = send(app(chicago()), "GET", "/api/producers", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![1, 2, 3, 4]);
        assert!(body[2]["location"].is_null());
    }

    #[tokio::test]
    async fn test_nearby_uses_default_radius_and_ranks() {
        let (status, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/nearby?lat=41.8781&lng=-87.6298",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![2, 1]);

        let lincoln_park = body[1]["distance_km"].as_f64().unwrap();
        assert!((5.0..=5.3).contains(&lincoln_park));
        assert_eq!(body[1]["distance_label"], "5.1 km");
        assert_eq!(body[1]["unit"], "km");
    }

    #[tokio::test]
    async fn test_nearby_reports_requested_unit() {
        let (_, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/nearby?lat=41.8781&lng=-87.6298&radius_km=6&unit=mi",
            None,
        )
        .await;
        assert_eq!(body[1]["unit"], "mi");
        assert_eq!(body[1]["distance_label"], "3.1 mi");
        let miles = body[1]["distance"].as_f64().unwrap();
        let km = body[1]["distance_km"].as_f64().unwrap();
        assert!(miles < km);
    }

    #[tokio::test]
    async fn test_nearby_rejects_missing_origin() {
        let (status, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/nearby?lat=41.8781",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("origin"));

        let (status, _) = send(
            app(chicago()),
            "GET",
            "/api/producers/nearby?lat=95&lng=0",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_nearby_negative_radius_is_empty() {
        let (status, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/nearby?lat=41.8781&lng=-87.6298&radius_km=-1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_matches_respects_radius_and_limit() {
        let (status, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/matches?lat=41.8781&lng=-87.6298&radius_km=50",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let matches = body.as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0]["score"].as_f64().unwrap() >= matches[1]["score"].as_f64().unwrap());

        let (_, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/matches?lat=41.8781&lng=-87.6298&limit=1",
            None,
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_matches_score_required_capabilities() {
        let store = chicago();
        let mut letterpress = Repository::<Producer>::get(&store, ProducerId::new(2))
            .await
            .unwrap()
            .unwrap();
        letterpress.capabilities = vec!["Letterpress".to_string(), "Foil stamping".to_string()];
        store.put(letterpress).await.unwrap();

        let (status, body) = send(
            app(store),
            "GET",
            "/api/producers/matches?lat=41.8781&lng=-87.6298&radius_km=50&capabilities=foil,%20letterpress",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let matches = body.as_array().unwrap();
        assert_eq!(matches[0]["producer"]["id"], 2);
        assert_eq!(matches[0]["factors"]["capabilities"], 1.0);
        // Producer 1 lists no capabilities, so the factor stays neutral.
        assert_eq!(matches[1]["factors"]["capabilities"], 0.5);
    }

    #[tokio::test]
    async fn test_map_frames_results() {
        let (status, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/map?lat=41.8781&lng=-87.6298&width=800&height=600",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["producers"].as_array().unwrap().len(), 2);

        let north = body["bounds"]["north"].as_f64().unwrap();
        let south = body["bounds"]["south"].as_f64().unwrap();
        assert!((north - 41.933).abs() < 1e-9);
        assert!((south - 41.870).abs() < 1e-9);

        let center_lat = body["center"]["lat"].as_f64().unwrap();
        assert!((center_lat - 41.9015).abs() < 1e-9);
        let zoom = body["zoom"].as_f64().unwrap();
        assert!(zoom > 10.0 && zoom < 14.0, "{zoom}");
    }

    #[tokio::test]
    async fn test_map_without_results_centers_on_origin() {
        let (status, body) = send(
            app(chicago()),
            "GET",
            "/api/producers/map?lat=10&lng=10",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["center"]["lat"], 10.0);
        assert!(body["bounds"].is_null());
        assert_eq!(body["zoom"], 10.0);
    }

    #[tokio::test]
    async fn test_upsert_stores_invalid_location_as_none() {
        let store = MemoryStore::new();
        let (status, body) = send(
            app(store.clone()),
            "PUT",
            "/api/producers/9",
            Some(json!({
                "name": "Edge Case Press",
                "location": "somewhere on Clark St",
                "capabilities": ["risograph"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["location"].is_null());
        assert!(body["availability_percent"].is_null());

        let (status, body) = send(
            app(store.clone()),
            "PUT",
            "/api/producers/9",
            Some(json!({
                "name": "Edge Case Press",
                "location": {"lat": "41.88", "lon": "-87.63"},
                "rating": 9.0,
                "review_count": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["location"]["lat"], 41.88);
        assert_eq!(body["rating"], 5.0);

        let stored = Repository::<Producer>::get(&store, ProducerId::new(9))
            .await
            .unwrap();
        assert!(stored.unwrap().location.is_some());
    }

    #[tokio::test]
    async fn test_unknown_producer_is_not_found() {
        let (status, _) = send(app(chicago()), "GET", "/api/producers/77", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
