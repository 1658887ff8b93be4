//! Integration tests for Pressly.
//!
//! Every test runs the real router on an ephemeral port against an
//! in-memory store. Geocoding goes to [`FakeGeocoder`], a local
//! Nominatim stand-in, so no database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pressly-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use pressly_api::config::{ApiConfig, GeocoderConfig};
use pressly_api::state::AppState;
use pressly_core::store::MemoryStore;
use pressly_core::{GeoPoint, Producer, ProducerId};

/// A running API server plus a client pointed at it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub store: MemoryStore,
}

impl TestContext {
    /// Start the API over `store` with the default local configuration.
    pub async fn new(store: MemoryStore) -> Self {
        Self::with_config(ApiConfig::local(), store).await
    }

    /// Start the API over `store` with `config`.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot bind a local port.
    pub async fn with_config(config: ApiConfig, store: MemoryStore) -> Self {
        let state = AppState::new(config, store.clone()).expect("Failed to create app state");
        let addr = serve(pressly_api::app(state)).await;

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            store,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Bind `127.0.0.1:0` and serve `app` in the background.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Test server error");
    });

    addr
}

/// Four producers around downtown Chicago, one without a location.
///
/// # Panics
///
/// Does not panic: every coordinate is in range.
#[must_use]
pub fn chicago_producers() -> Vec<Producer> {
    let at = |lat, lng| Some(GeoPoint::new(lat, lng).expect("fixture coordinates are valid"));
    vec![
        Producer::new(ProducerId::new(1), "Lincoln Park Printing", at(41.9230, -87.6397))
            .with_rating(4.8, 40)
            .with_availability(60),
        Producer::new(ProducerId::new(2), "Loop Letterpress", at(41.8800, -87.6300))
            .with_availability(20),
        Producer::new(ProducerId::new(3), "No Address Yet", None),
        Producer::new(ProducerId::new(4), "Milwaukee Big Format", at(43.0389, -87.9065))
            .with_rating(4.9, 120),
    ]
}

/// Downtown Chicago, the origin most tests search from.
pub const DOWNTOWN: (f64, f64) = (41.8781, -87.6298);

/// A local Nominatim stand-in.
///
/// - `/search?q=...` finds "chicago", returns `[]` for anything else, and
///   answers 500 for "explode".
/// - `/reverse?lat=..&lon=..` answers the Nominatim error body near `(0, 0)`.
pub struct FakeGeocoder {
    pub base_url: Url,
    hits: Arc<AtomicUsize>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: String,
}

#[derive(Debug, Deserialize)]
struct ReverseParams {
    lat: f64,
    lon: f64,
}

impl FakeGeocoder {
    /// Start the fake on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the base URL does not parse.
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/search", get(fake_search))
            .route("/reverse", get(fake_reverse))
            .with_state(Arc::clone(&hits));
        let addr = serve(app).await;

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("fake geocoder URL"),
            hits,
        }
    }

    /// API configuration pointing at this fake.
    #[must_use]
    pub fn config(&self) -> ApiConfig {
        ApiConfig {
            geocoder: GeocoderConfig {
                base_url: self.base_url.clone(),
                user_agent: "pressly-integration-tests".to_string(),
            },
            ..ApiConfig::local()
        }
    }

    /// Requests the fake has answered so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn chicago_place() -> serde_json::Value {
    json!({
        "lat": "41.8781136",
        "lon": "-87.6297982",
        "display_name": "Chicago, Cook County, Illinois, United States",
        "address": {
            "city": "Chicago",
            "county": "Cook County",
            "state": "Illinois",
            "country": "United States",
            "country_code": "us"
        }
    })
}

async fn fake_search(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<SearchParams>,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    let q = params.q.to_lowercase();
    if q.contains("explode") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response();
    }
    if q.contains("chicago") {
        return Json(json!([chicago_place()])).into_response();
    }
    Json(json!([])).into_response()
}

async fn fake_reverse(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<ReverseParams>,
) -> Json<serde_json::Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    if params.lat.abs() < 1.0 && params.lon.abs() < 1.0 {
        return Json(json!({"error": "Unable to geocode"}));
    }
    Json(chicago_place())
}
