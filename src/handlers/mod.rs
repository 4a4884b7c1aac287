//! Thin REST shell (§7 "User-visible behavior", component boundary: the
//! engine's loops run independently of whether anything is listening on
//! HTTP at all). Routes are deliberately few: a health probe, the current
//! risk snapshot, a pricing quote, keeper status, and a Prometheus scrape
//! endpoint.

pub mod health;
pub mod keeper_status;
pub mod metrics;
pub mod pricing;
pub mod risk;

use crate::cache::MarketConditionsCache;
use crate::config::PricingSettings;
use crate::keeper::OracleKeeper;
use crate::metrics::EngineMetrics;
use crate::pricing::PricingEngine;
use crate::risk::RiskMonitor;
use crate::store::PolicyStore;
use axum::routing::get;
use axum::Router;
use moka::future::Cache;
use pricing::CachedQuote;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Everything a handler needs, threaded through as `axum` shared state
/// rather than a global (§9 "Global state": every piece of shared state is a
/// dependency-injected handle).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PolicyStore>,
    pub market_cache: MarketConditionsCache,
    pub monitor: Arc<RiskMonitor>,
    pub keeper: Arc<OracleKeeper>,
    pub pricing_engine: Arc<PricingEngine>,
    pub pricing_settings: PricingSettings,
    pub metrics: Arc<EngineMetrics>,
    /// Idempotent-quote cache (§7): identical quote requests made within
    /// `quote_validity_window_secs` of one another return the same
    /// breakdown instead of recomposing the full rate chain.
    pub quote_cache: Cache<String, CachedQuote>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PolicyStore>,
        market_cache: MarketConditionsCache,
        monitor: Arc<RiskMonitor>,
        keeper: Arc<OracleKeeper>,
        pricing_engine: Arc<PricingEngine>,
        pricing_settings: PricingSettings,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        let ttl = Duration::from_secs(pricing_settings.quote_validity_window_secs.max(1) as u64);
        let quote_cache = Cache::builder().time_to_live(ttl).max_capacity(10_000).build();
        Self {
            store,
            market_cache,
            monitor,
            keeper,
            pricing_engine,
            pricing_settings,
            metrics,
            quote_cache,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/risk/snapshot", get(risk::snapshot))
        .route("/pricing/quote", get(pricing::quote))
        .route("/keeper/status", get(keeper_status::status))
        .route("/metrics", get(metrics::scrape))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
