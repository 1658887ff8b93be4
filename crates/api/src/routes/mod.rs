//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Store reachable
//!
//! # Levels
//! GET  /api/levels/{order_count}        - Level summary for a raw count
//!
//! # Accounts
//! GET  /api/accounts                    - All accounts
//! GET  /api/accounts/{id}               - Account with level and interface
//! PUT  /api/accounts/{id}               - Create or rename
//! POST /api/accounts/{id}/orders        - Record a completed order
//! PUT  /api/accounts/{id}/interface     - Set or clear interface preference
//!
//! # Producers
//! GET  /api/producers                   - All producers
//! GET  /api/producers/{id}              - One producer
//! PUT  /api/producers/{id}              - Create or replace
//! GET  /api/producers/nearby            - Radius search, nearest first
//! GET  /api/producers/matches           - Weighted match scoring
//! GET  /api/producers/map               - Center, bounds and zoom for a map
//!
//! # Geocoding (rate limited)
//! GET  /api/geocode?q=                  - Forward lookup
//! GET  /api/geocode/reverse?lat=&lng=   - Reverse lookup
//! ```

use axum::Router;

use crate::state::AppState;

pub mod accounts;
pub mod geocode;
pub mod health;
pub mod levels;
pub mod producers;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(levels::router())
        .merge(accounts::router())
        .merge(producers::router())
        .merge(geocode::router())
}
