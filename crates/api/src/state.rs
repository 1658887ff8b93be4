//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::config::ApiConfig;
use crate::services::{GeocodeError, GeocodingClient};
use crate::store::Store;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the geocoder and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Store,
    geocoder: GeocodingClient,
    /// Serializes read-modify-write updates to accounts within this process.
    account_writes: Mutex<()>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the geocoding client cannot be built from `config`.
    pub fn new(config: ApiConfig, store: impl Into<Store>) -> Result<Self, GeocodeError> {
        let geocoder = GeocodingClient::new(&config.geocoder)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store: store.into(),
                geocoder,
                account_writes: Mutex::new(()),
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the record store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Hold this while loading, changing and saving an account.
    pub async fn lock_account_writes(&self) -> MutexGuard<'_, ()> {
        self.inner.account_writes.lock().await
    }

    /// Get a reference to the geocoding client.
    #[must_use]
    pub fn geocoder(&self) -> &GeocodingClient {
        &self.inner.geocoder
    }
}
