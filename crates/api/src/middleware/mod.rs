//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting on geocode routes (governor)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::geocode_rate_limiter;
pub use request_id::request_id_middleware;
