//! End-to-end exercise of the two long-running loops (§4.7, §4.8) against
//! an in-memory store, a fixture hedge-market-data source and a `NoopSigner`
//! — no network, no real on-chain submission.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use sure_risk_engine::cache::MarketConditionsCache;
use sure_risk_engine::config::{HedgeSettings, KeeperSettings, MonitorSettings, PricingSettings, RiskThresholds};
use sure_risk_engine::domain::{Asset, Blockchain, CoverageType, MarketConditions, Policy, PolicyStatus, ProductKey};
use sure_risk_engine::error::ClientError;
use sure_risk_engine::hedge::{HedgeCostFetcher, HedgeMarketData};
use sure_risk_engine::keeper::OracleKeeper;
use sure_risk_engine::metrics::EngineMetrics;
use sure_risk_engine::onchain::{NoopSigner, Signer};
use sure_risk_engine::risk::RiskMonitor;
use sure_risk_engine::scheduling::LoggingAlertSink;
use sure_risk_engine::store::{InMemoryPolicyStore, PolicyStore};

struct NoMarketsHedgeData;

#[async_trait]
impl HedgeMarketData for NoMarketsHedgeData {
    async fn polymarket_odds(&self, _product: ProductKey) -> Result<Option<f64>, ClientError> {
        Ok(None)
    }
    async fn hyperliquid_daily_funding(&self, _product: ProductKey) -> Result<Option<f64>, ClientError> {
        Ok(None)
    }
    async fn binance_hourly_funding(&self, _product: ProductKey) -> Result<Option<f64>, ClientError> {
        Ok(None)
    }
}

fn sample_policy(asset: Asset, chain: Blockchain, coverage_cents: u64) -> Policy {
    let now = Utc::now();
    Policy {
        id: uuid::Uuid::new_v4(),
        coverage_type: CoverageType::Depeg,
        chain,
        asset,
        coverage_amount_cents: coverage_cents,
        trigger_price: 0.97,
        floor_price: 0.90,
        start_ts: now,
        expiry_ts: now + Duration::days(90),
        status: PolicyStatus::Active,
    }
}

fn sample_market() -> MarketConditions {
    let mut stablecoin_prices = std::collections::HashMap::new();
    stablecoin_prices.insert(Asset::Usdc, (0.998, 0.95));
    stablecoin_prices.insert(Asset::Usdt, (0.995, 0.9));
    let mut bridge_health_scores = std::collections::HashMap::new();
    bridge_health_scores.insert("wormhole".to_string(), 0.9);
    MarketConditions {
        stablecoin_prices,
        bridge_health_scores,
        cex_liquidation_rate: 0.1,
        chain_gas_prices: std::collections::HashMap::new(),
        protocol_exploit_count_24h: 0,
        overall_volatility_index: 0.2,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn risk_monitor_produces_snapshot_from_seeded_policies() {
    let store = InMemoryPolicyStore::new();
    store.upsert(sample_policy(Asset::Usdc, Blockchain::Ethereum, 1_000_000_00)).await;
    store.upsert(sample_policy(Asset::Usdt, Blockchain::Polygon, 500_000_00)).await;
    store.seed_price_history(Asset::Usdc, vec![1.0, 0.999, 0.998, 1.001]).await;
    store.seed_price_history(Asset::Usdt, vec![1.0, 0.995, 0.994, 0.996]).await;

    let market_cache = MarketConditionsCache::new();
    market_cache.publish(sample_market()).await;

    let monitor = RiskMonitor::new(
        store as Arc<dyn PolicyStore>,
        market_cache,
        Arc::new(LoggingAlertSink),
        RiskThresholds::default(),
        MonitorSettings::default(),
    );

    let snapshot = monitor.run_iteration().await;

    assert_eq!(snapshot.active_policy_count, 2);
    assert_eq!(snapshot.expired_policy_count, 0);
    assert!(snapshot.var_95.is_finite());
    assert!(snapshot.var_99 >= snapshot.var_95);
    assert!(snapshot.ltv > 0.0);
    assert!(monitor.last_snapshot().await.is_none());
}

#[tokio::test]
async fn risk_monitor_marks_var_nan_with_no_market_snapshot() {
    let store = InMemoryPolicyStore::new();
    store.upsert(sample_policy(Asset::Usdc, Blockchain::Ethereum, 1_000_000_00)).await;

    let monitor = RiskMonitor::new(
        store as Arc<dyn PolicyStore>,
        MarketConditionsCache::new(),
        Arc::new(LoggingAlertSink),
        RiskThresholds::default(),
        MonitorSettings::default(),
    );

    let snapshot = monitor.run_iteration().await;
    assert!(snapshot.var_95.is_nan());
    assert!(snapshot.expected_loss.is_nan());
}

#[tokio::test]
async fn oracle_keeper_publishes_every_valid_product_on_a_full_tick() {
    let store = InMemoryPolicyStore::new();
    store.upsert(sample_policy(Asset::Usdc, Blockchain::Ethereum, 2_000_000_00)).await;

    let market_cache = MarketConditionsCache::new();
    market_cache.publish(sample_market()).await;

    let contract_address = alloy_primitives::Address::ZERO;
    let signer: Arc<dyn Signer> = Arc::new(NoopSigner::new(contract_address));
    let hedge_data: Arc<dyn HedgeMarketData> = Arc::new(NoMarketsHedgeData);

    let mut keeper_settings = KeeperSettings::default();
    keeper_settings.batch_size = 1000;

    let keeper = OracleKeeper::new(
        store as Arc<dyn PolicyStore>,
        market_cache,
        HedgeCostFetcher::new(HedgeSettings::default()),
        hedge_data,
        signer,
        contract_address,
        PricingSettings::default(),
        keeper_settings,
        Arc::new(EngineMetrics::new()),
    );

    let successes = keeper.run_iteration().await;
    let expected = sure_risk_engine::domain::valid_catalog().len();
    assert_eq!(successes, expected);

    let snapshot = keeper.metrics.snapshot().await;
    assert_eq!(snapshot.successful_updates, expected as u64);
    assert_eq!(snapshot.failed_updates, 0);
}

#[tokio::test]
async fn oracle_keeper_skips_iteration_with_no_market_snapshot() {
    let store = InMemoryPolicyStore::new();
    let contract_address = alloy_primitives::Address::ZERO;
    let signer: Arc<dyn Signer> = Arc::new(NoopSigner::new(contract_address));
    let hedge_data: Arc<dyn HedgeMarketData> = Arc::new(NoMarketsHedgeData);

    let keeper = OracleKeeper::new(
        store as Arc<dyn PolicyStore>,
        MarketConditionsCache::new(),
        HedgeCostFetcher::new(HedgeSettings::default()),
        hedge_data,
        signer,
        contract_address,
        PricingSettings::default(),
        KeeperSettings::default(),
        Arc::new(EngineMetrics::new()),
    );

    assert_eq!(keeper.run_iteration().await, 0);
}
