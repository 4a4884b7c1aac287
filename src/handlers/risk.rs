//! Risk snapshot endpoint (§4.7, §3 `RiskSnapshot`).

use crate::domain::RiskSnapshot;
use crate::error::AppError;
use crate::handlers::AppState;
use axum::extract::State;
use axum::Json;

/// Returns the last snapshot the Risk Monitor assembled. `AppError::NotFound`
/// before the first iteration has completed, rather than a fabricated empty
/// snapshot (§7: no silent defaults for a subsystem that has not run yet).
pub async fn snapshot(State(state): State<AppState>) -> Result<Json<RiskSnapshot>, AppError> {
    state
        .monitor
        .last_snapshot()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("risk monitor has not completed an iteration yet".to_string()))
}
