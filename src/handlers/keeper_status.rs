//! Oracle Keeper status (§4.8, §9 "Global state"): exposes the same
//! `KeeperMetrics` snapshot the Prometheus gauges are derived from, in a
//! form a dashboard can poll directly.

use crate::handlers::AppState;
use axum::extract::State;
use axum::Json;

pub async fn status(State(state): State<AppState>) -> Json<crate::keeper::KeeperMetricsSnapshot> {
    Json(state.keeper.metrics.snapshot().await)
}
