//! Liveness probe. Intentionally dependency-free: a 200 here only means the
//! process is scheduling tasks, not that any upstream is healthy.

use axum::Json;
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<Utc>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", timestamp: Utc::now() })
}
