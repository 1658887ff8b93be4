//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `PRESSLY_HOST` - Bind address (default: 127.0.0.1)
//! - `PRESSLY_PORT` - Listen port (default: 3000)
//! - `PRESSLY_DATABASE_URL` - `PostgreSQL` connection string, falls back to
//!   `DATABASE_URL`. Without either the in-memory store is used.
//! - `PRESSLY_GEOCODER_URL` - Nominatim-compatible base URL
//!   (default: <https://nominatim.openstreetmap.org>)
//! - `PRESSLY_GEOCODER_USER_AGENT` - User-Agent sent to the geocoder
//! - `PRESSLY_DEFAULT_RADIUS_KM` - Radius for nearby searches that omit one (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_RADIUS_KM: &str = "10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` connection URL (contains password). `None` selects the in-memory store.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Geocoding collaborator settings
    pub geocoder: GeocoderConfig,
    /// Radius used by nearby searches that do not pass one
    pub default_radius_km: f64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Geocoder endpoint configuration.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Base URL of a Nominatim-compatible service
    pub base_url: Url,
    /// Nominatim's usage policy requires an identifying User-Agent
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    /// # Panics
    ///
    /// Does not panic: the default URL is a valid constant.
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_GEOCODER_URL).expect("default geocoder URL is valid"),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if any variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("PRESSLY_DATABASE_URL");
        let host = get_env_or_default("PRESSLY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PRESSLY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PRESSLY_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PRESSLY_PORT".to_string(), e.to_string()))?;
        let geocoder = GeocoderConfig::from_env()?;
        let default_radius_km = parse_radius(
            "PRESSLY_DEFAULT_RADIUS_KM",
            &get_env_or_default("PRESSLY_DEFAULT_RADIUS_KM", DEFAULT_RADIUS_KM),
        )?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            geocoder,
            default_radius_km,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for tests and local tooling: in-memory store, default geocoder.
    #[must_use]
    pub fn local() -> Self {
        Self {
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            geocoder: GeocoderConfig::default(),
            default_radius_km: 10.0,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GeocoderConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_env_or_default("PRESSLY_GEOCODER_URL", DEFAULT_GEOCODER_URL);
        let base_url = parse_base_url("PRESSLY_GEOCODER_URL", &raw)?;
        let user_agent =
            get_optional_env("PRESSLY_GEOCODER_USER_AGENT").unwrap_or_else(default_user_agent);
        Ok(Self {
            base_url,
            user_agent,
        })
    }
}

fn default_user_agent() -> String {
    format!("Pressly/{}", env!("CARGO_PKG_VERSION"))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    get_optional_env(primary_key)
        .or_else(|| get_optional_env("DATABASE_URL"))
        .map(SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a search radius: finite and non-negative.
fn parse_radius(key: &str, value: &str) -> Result<f64, ConfigError> {
    let radius = value
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !radius.is_finite() || radius < 0.0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be a finite, non-negative number (got {radius})"),
        ));
    }
    Ok(radius)
}

/// Parse a base URL, requiring http(s).
///
/// The path always ends in `/` so endpoint names join beneath it.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{other}'"),
            ));
        }
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
