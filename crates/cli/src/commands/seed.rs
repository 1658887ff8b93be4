//! Seed producers from a YAML file.
//!
//! ```yaml
//! producers:
//!   - id: 1
//!     name: Lincoln Park Printing
//!     location: { lat: 41.9230, lng: -87.6397 }
//!     availability_percent: 80
//!     rating: 4.8
//!     review_count: 40
//!     capabilities: [letterpress, foil]
//!   - id: 2
//!     name: No Address Yet
//! ```
//!
//! Coordinates may be numbers or strings. Producers with missing or invalid
//! coordinates are kept without a location.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use pressly_api::db::{self, PgStore};
use pressly_api::store::Store;
use pressly_core::Producer;
use pressly_core::store::{Repository, StoreError};

/// Errors that can occur while loading or seeding producers.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid producer: {0}")]
    Invalid(String),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    producers: Vec<Producer>,
}

/// Parse and validate a producer seed document.
///
/// # Errors
///
/// Returns `SeedError::Yaml` for malformed input and `SeedError::Invalid` for
/// blank names or duplicate ids.
pub fn parse_producers(yaml: &str) -> Result<Vec<Producer>, SeedError> {
    let file: SeedFile = serde_yaml::from_str(yaml)?;

    let mut seen = BTreeSet::new();
    for producer in &file.producers {
        if producer.name.trim().is_empty() {
            return Err(SeedError::Invalid(format!(
                "producer {} has an empty name",
                producer.id
            )));
        }
        if !seen.insert(producer.id) {
            return Err(SeedError::Invalid(format!(
                "producer {} appears more than once",
                producer.id
            )));
        }
    }

    Ok(file.producers)
}

/// Read and validate producers from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not validate.
pub async fn load_producers(path: &Path) -> Result<Vec<Producer>, SeedError> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
    parse_producers(&yaml)
}

/// Upsert producers from a YAML file into `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the file does not
/// validate, or a database write fails.
pub async fn producers(path: &Path, clear_existing: bool) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let producers = load_producers(path).await?;
    let unlocated = producers.iter().filter(|p| p.location.is_none()).count();
    if unlocated > 0 {
        warn!(unlocated, "Some producers have no usable location and will not appear in searches");
    }

    let database_url =
        super::database_url().ok_or(SeedError::MissingEnvVar("PRESSLY_DATABASE_URL"))?;
    let pool = db::create_pool(&database_url).await?;
    let store = Store::from(PgStore::new(pool));

    if clear_existing {
        info!("Clearing existing producers");
        store.clear_producers().await?;
    }

    let total = producers.len();
    for producer in producers {
        store.put(producer).await?;
    }

    info!("Seeding complete!");
    info!("  Producers upserted: {total}");
    info!("  Without location: {unlocated}");
    Ok(())
}
