//! Clients for external collaborators.

pub mod geocoding;

pub use geocoding::{Address, GeocodeError, GeocodingClient, Place};
