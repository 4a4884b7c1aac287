use sure_risk_engine::cache::MarketConditionsCache;
use sure_risk_engine::clients::{HttpBridgeHealthClient, HttpCexClient, HttpChainMetricsClient, HttpHedgeMarketData, OracleAggregator};
use sure_risk_engine::config::Settings;
use sure_risk_engine::domain::{Asset, MarketConditions};
use sure_risk_engine::handlers::{build_router, AppState};
use sure_risk_engine::hedge::{HedgeCostFetcher, HedgeMarketData};
use sure_risk_engine::keeper::OracleKeeper;
use sure_risk_engine::metrics::EngineMetrics;
use sure_risk_engine::onchain::{NoopSigner, Signer};
use sure_risk_engine::pricing::PricingEngine;
use sure_risk_engine::risk::RiskMonitor;
use sure_risk_engine::scheduling::{AlertSink, LoggingAlertSink, PagerDutyAlertSink};
use sure_risk_engine::store::{InMemoryPolicyStore, PolicyStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("starting sure-risk-engine");
    let settings = Settings::load()?;

    let store: Arc<dyn PolicyStore> = InMemoryPolicyStore::new();
    let market_cache = MarketConditionsCache::new();
    let metrics = Arc::new(EngineMetrics::new());

    let alert_sink: Arc<dyn AlertSink> = match &settings.alerts.pagerduty_routing_key {
        Some(key) => Arc::new(PagerDutyAlertSink::new(settings.alerts.pagerduty_url.clone(), key.clone(), settings.alerts.timeout_secs)),
        None => Arc::new(LoggingAlertSink),
    };

    let monitor = Arc::new(RiskMonitor::new(
        Arc::clone(&store),
        market_cache.clone(),
        alert_sink,
        settings.risk_thresholds,
        settings.monitor.clone(),
    ));

    let hedge_data: Arc<dyn HedgeMarketData> = Arc::new(HttpHedgeMarketData::new(&settings.upstreams, &settings.hedge));
    let contract_address = settings.onchain.oracle_contract_address.parse().unwrap_or(alloy_primitives::Address::ZERO);
    let signer: Arc<dyn Signer> = Arc::new(NoopSigner::new(contract_address));

    let keeper = Arc::new(OracleKeeper::new(
        Arc::clone(&store),
        market_cache.clone(),
        HedgeCostFetcher::new(settings.hedge),
        hedge_data,
        signer,
        contract_address,
        settings.pricing.clone(),
        settings.keeper.clone(),
        Arc::clone(&metrics),
    ));

    let pricing_engine = Arc::new(PricingEngine::new(settings.pricing.clone()));

    let state = AppState::new(
        Arc::clone(&store),
        market_cache.clone(),
        Arc::clone(&monitor),
        Arc::clone(&keeper),
        pricing_engine,
        settings.pricing.clone(),
        Arc::clone(&metrics),
    );

    let cancel = CancellationToken::new();

    let oracle_handle = {
        let cache = market_cache.clone();
        let upstreams = settings.upstreams.clone();
        let metrics = Arc::clone(&metrics);
        let cancel = cancel.clone();
        tokio::spawn(async move { run_oracle_feed(cache, upstreams, metrics, cancel).await })
    };

    let monitor_handle = {
        let monitor = Arc::clone(&monitor);
        let cancel = cancel.clone();
        tokio::spawn(async move { monitor.run(cancel).await })
    };

    let keeper_handle = {
        let keeper = Arc::clone(&keeper);
        let cancel = cancel.clone();
        tokio::spawn(async move { keeper.run(cancel).await })
    };

    let server_handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_http(state, cancel).await {
                error!(error = %e, "http server error");
            }
        })
    };

    info!("sure-risk-engine started: risk monitor, oracle keeper and HTTP shell are running");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    cancel.cancel();
    let shutdown_budget = Duration::from_secs(settings.monitor.shutdown_flush_budget_secs);
    let _ = tokio::time::timeout(shutdown_budget, async {
        let _ = tokio::join!(oracle_handle, monitor_handle, keeper_handle, server_handle);
    })
    .await;

    info!("sure-risk-engine stopped");
    Ok(())
}

async fn serve_http(state: AppState, cancel: CancellationToken) -> Result<(), std::io::Error> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "http shell listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

/// Feeds the shared `MarketConditionsCache` (§3 "single writer"): aggregates
/// consensus stablecoin prices plus bridge/cex/gas/exploit inputs on the
/// same cadence the keeper and monitor expect a fresh snapshot at.
async fn run_oracle_feed(
    cache: MarketConditionsCache,
    upstreams: sure_risk_engine::config::UpstreamSettings,
    metrics: Arc<EngineMetrics>,
    cancel: CancellationToken,
) {
    use sure_risk_engine::clients::PriceSource;
    use sure_risk_engine::clients::oracle::HttpPriceSource;

    let sources: Vec<Arc<dyn PriceSource>> = vec![
        Arc::new(HttpPriceSource::new("chainlink", upstreams.chainlink_url.clone(), upstreams.rate_limit_per_minute, upstreams.http_timeout_secs)),
        Arc::new(HttpPriceSource::new("pyth", upstreams.pyth_url.clone(), upstreams.rate_limit_per_minute, upstreams.http_timeout_secs)),
        Arc::new(HttpPriceSource::new("redstone", upstreams.redstone_url.clone(), upstreams.rate_limit_per_minute, upstreams.http_timeout_secs)),
    ];
    let aggregator = OracleAggregator::new(sources);
    let bridge_client = HttpBridgeHealthClient::new(upstreams.defillama_url.clone(), upstreams.rate_limit_per_minute, upstreams.http_timeout_secs);
    let cex_client = HttpCexClient::new(upstreams.binance_url.clone(), upstreams.rate_limit_per_minute, upstreams.http_timeout_secs);
    let chain_metrics_client = HttpChainMetricsClient::new(upstreams.etherscan_url.clone(), upstreams.rate_limit_per_minute, upstreams.http_timeout_secs);

    let mut interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {
                let mut stablecoin_prices = std::collections::HashMap::new();
                for asset in Asset::STABLECOINS {
                    match aggregator.aggregate(asset).await {
                        Ok(consensus) => {
                            metrics.oracle_price_usd.with_label_values(&[&asset.to_string()]).set(consensus.median_price);
                            metrics.oracle_confidence.with_label_values(&[&asset.to_string()]).set(consensus.confidence);
                            let max_deviation_pct = consensus
                                .sources
                                .iter()
                                .map(|(_, price)| ((price - consensus.median_price) / consensus.median_price).abs() * 100.0)
                                .fold(0.0_f64, f64::max);
                            metrics.oracle_divergence_percent.with_label_values(&[&asset.to_string()]).set(max_deviation_pct);
                            stablecoin_prices.insert(asset, (consensus.median_price, consensus.confidence));
                        }
                        Err(_) => {
                            metrics.oracle_failures_total.with_label_values(&[&asset.to_string()]).inc();
                        }
                    }
                }

                let bridge_health_scores = bridge_client.fetch_health_scores().await.unwrap_or_default();
                let cex_liquidation_rate = cex_client.fetch_liquidation_rate().await.unwrap_or(0.0);
                let chain_gas_prices = chain_metrics_client.fetch_gas_prices().await.unwrap_or_default();

                cache
                    .publish(MarketConditions {
                        stablecoin_prices,
                        bridge_health_scores,
                        cex_liquidation_rate,
                        chain_gas_prices,
                        protocol_exploit_count_24h: 0,
                        overall_volatility_index: 0.0,
                        timestamp: chrono::Utc::now(),
                    })
                    .await;
            }
        }
    }
}
