//! Nominatim geocoding client.
//!
//! Forward and reverse lookups against any Nominatim-compatible service.
//! Results, including "nothing found", are cached for an hour with `moka`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use pressly_core::{GeoPoint, RawCoordinate, RawGeoPoint};

use crate::config::GeocoderConfig;

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const CACHE_CAPACITY: u64 = 10_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the geocoder.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Geocoder answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Search text was empty.
    #[error("query must not be empty")]
    EmptyQuery,

    /// Client could not be configured.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Postal address parts of a geocoding result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    /// City, or the closest settlement Nominatim knows (town, village, hamlet).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub location: GeoPoint,
    pub display_name: String,
    pub address: Address,
}

// Wire shapes. Nominatim returns coordinates as strings.

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Option<RawCoordinate>,
    lon: Option<RawCoordinate>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

/// Reverse lookups answer `{"error": "..."}` with status 200 when nothing is there.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    NotFound { error: String },
    Found(NominatimPlace),
}

impl From<NominatimAddress> for Address {
    fn from(raw: NominatimAddress) -> Self {
        Self {
            house_number: raw.house_number,
            road: raw.road,
            city: raw.city.or(raw.town).or(raw.village).or(raw.hamlet),
            state: raw.state,
            postcode: raw.postcode,
            country: raw.country,
            country_code: raw.country_code,
        }
    }
}

impl NominatimPlace {
    /// Places with unusable coordinates are dropped.
    fn into_place(self) -> Option<Place> {
        let location = RawGeoPoint {
            lat: self.lat,
            lng: self.lon,
        }
        .normalize()?;

        Some(Place {
            location,
            display_name: self.display_name,
            address: self.address.into(),
        })
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Search(String),
    /// Coordinates rounded to 1e-6 degrees (about 11 cm).
    Reverse(i64, i64),
}

/// Client for a Nominatim-compatible geocoding service.
#[derive(Clone)]
pub struct GeocodingClient {
    inner: Arc<GeocodingClientInner>,
}

struct GeocodingClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, Option<Place>>,
}

impl std::fmt::Debug for GeocodingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GeocodingClient {
    /// Create a new geocoding client.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::Config` if the User-Agent is not a valid header
    /// value, or `GeocodeError::Http` if the HTTP client fails to build.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| GeocodeError::Config(format!("invalid User-Agent: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(GeocodingClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Resolve free-form text to the best matching place.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::EmptyQuery` for blank input, otherwise any
    /// transport or parse failure.
    #[instrument(skip(self, query), fields(query = %query))]
    pub async fn search(&self, query: &str) -> Result<Option<Place>, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyQuery);
        }

        let key = CacheKey::Search(query.to_lowercase());
        if let Some(cached) = self.inner.cache.get(&key).await {
            debug!("geocode cache hit");
            return Ok(cached);
        }

        let url = self.endpoint(
            "search",
            &[
                ("format", "json"),
                ("q", query),
                ("limit", "1"),
                ("addressdetails", "1"),
            ],
        )?;
        let body = self.fetch(url).await?;
        let place = parse_search(&body)?;

        self.inner.cache.insert(key, place.clone()).await;
        Ok(place)
    }

    /// Resolve a coordinate to the nearest addressable place.
    ///
    /// # Errors
    ///
    /// Returns any transport or parse failure.
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn reverse(&self, location: GeoPoint) -> Result<Option<Place>, GeocodeError> {
        let key = reverse_key(location);
        if let Some(cached) = self.inner.cache.get(&key).await {
            debug!("reverse geocode cache hit");
            return Ok(cached);
        }

        let lat = location.lat().to_string();
        let lon = location.lng().to_string();
        let url = self.endpoint(
            "reverse",
            &[
                ("format", "json"),
                ("lat", &lat),
                ("lon", &lon),
                ("addressdetails", "1"),
            ],
        )?;
        let body = self.fetch(url).await?;
        let place = parse_reverse(&body)?;

        self.inner.cache.insert(key, place.clone()).await;
        Ok(place)
    }

    /// Drop all cached lookups.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, GeocodeError> {
        let mut url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| GeocodeError::Config(format!("invalid geocoder URL: {e}")))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<String, GeocodeError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn reverse_key(location: GeoPoint) -> CacheKey {
    // Bounded by the coordinate ranges, so the products fit in i64.
    CacheKey::Reverse(
        (location.lat() * 1e6).round() as i64,
        (location.lng() * 1e6).round() as i64,
    )
}

fn parse_search(body: &str) -> Result<Option<Place>, GeocodeError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;
    Ok(places.into_iter().find_map(NominatimPlace::into_place))
}

fn parse_reverse(body: &str) -> Result<Option<Place>, GeocodeError> {
    let response: ReverseResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;
    match response {
        ReverseResponse::Found(place) => Ok(place.into_place()),
        ReverseResponse::NotFound { error } => {
            debug!(%error, "reverse geocode found nothing");
            Ok(None)
        }
    }
}
