//! Prometheus scrape endpoint (§6).

use crate::handlers::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;

pub async fn scrape(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(market) = state.market_cache.get().await {
        let now = Utc::now();
        for (asset, _) in &market.stablecoin_prices {
            state
                .metrics
                .oracle_staleness_seconds
                .with_label_values(&[&asset.to_string()])
                .set(market.age_seconds(now) as f64);
        }
    }
    let body = state.metrics.render();
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
