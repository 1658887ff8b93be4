//! Level lookups for a bare order count.

use axum::{Json, Router, extract::Path, routing::get};

use pressly_core::level::LevelSummary;

use crate::state::AppState;

/// Build the levels router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/levels/{order_count}", get(show))
}

/// Level, features and progress for an order count. Negative counts clamp to zero.
pub async fn show(Path(order_count): Path<i64>) -> Json<LevelSummary> {
    Json(LevelSummary::for_count(order_count))
}
