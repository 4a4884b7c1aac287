//! Pricing quote endpoint (§4.3, §7 "User-visible behavior": "the quote
//! endpoint returns the last-known valid snapshot marked `stale=true` if
//! older than the validity window; an `Unavailable` error only when no
//! valid snapshot exists at all").

use crate::domain::Asset;
use crate::error::{AppError, ClientError};
use crate::handlers::AppState;
use crate::pricing::{round_half_even_cents, PremiumBreakdown, PricingRequest, VaultState};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub asset: String,
    pub coverage_amount_cents: u64,
    pub duration_days: f64,
    pub trigger_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedQuote {
    pub breakdown: PremiumBreakdown,
    pub risk_multiplier: f64,
    pub adjusted_premium_cents: i64,
}

#[derive(Serialize)]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub cached: CachedQuote,
    pub stale: bool,
}

fn cache_key(q: &QuoteQuery) -> String {
    format!("{}:{}:{}:{}", q.asset, q.coverage_amount_cents, q.duration_days, q.trigger_price)
}

pub async fn quote(State(state): State<AppState>, Query(query): Query<QuoteQuery>) -> Result<Json<QuoteResponse>, AppError> {
    let asset: Asset = query.asset.parse().map_err(|e| AppError::Internal(format!("invalid asset: {e}")))?;

    let market = state
        .market_cache
        .get()
        .await
        .ok_or_else(|| AppError::Client(ClientError::Unavailable("no market snapshot has been published yet".to_string())))?;
    let stale = market.is_stale(chrono::Utc::now(), state.pricing_settings.quote_validity_window_secs);

    let key = cache_key(&query);
    if let Some(cached) = state.quote_cache.get(&key).await {
        return Ok(Json(QuoteResponse { cached, stale }));
    }

    let request = PricingRequest {
        asset,
        coverage_amount_cents: query.coverage_amount_cents,
        duration_days: query.duration_days,
        trigger_price: query.trigger_price,
    };

    let policies = state.store.all_policies().await;
    let coverage_sold: f64 = policies.iter().filter(|p| p.asset == asset).map(crate::domain::Policy::coverage_usd).sum();
    let total_capital: f64 = policies.iter().map(crate::domain::Policy::coverage_usd).sum::<f64>().max(coverage_sold) / 0.5;
    let vault = VaultState { coverage_sold, total_capital };

    let market_stress = market.overall_volatility_index.clamp(0.0, 1.0);
    let risk_factors = state.pricing_settings.risk_factors_for(asset);

    let breakdown = state.pricing_engine.quote_with_breakdown(&request, &vault, market_stress, &risk_factors, None);

    let risk_multiplier = match state.monitor.last_snapshot().await {
        Some(snapshot) => state.monitor.risk_adjusted_multiplier(&snapshot, &request),
        None => 1.0,
    };
    let adjusted_premium_cents = round_half_even_cents(breakdown.final_premium_usd * risk_multiplier);

    let cached = CachedQuote { breakdown, risk_multiplier, adjusted_premium_cents };
    state.quote_cache.insert(key, cached.clone()).await;

    Ok(Json(QuoteResponse { cached, stale }))
}
