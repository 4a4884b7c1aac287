//! Oracle Keeper (§4.8, component C8). A periodic loop that derives
//! per-product multipliers and swing premiums from the latest market
//! snapshot and hedge quotes, then publishes both to the on-chain oracle
//! contract through an injected signer.

pub mod metrics;
pub mod multiplier;
pub mod scheduler;

pub use metrics::{KeeperMetrics, KeeperMetricsSnapshot};
pub use scheduler::UpdateStrategy;

use crate::config::{KeeperSettings, PricingSettings};
use crate::domain::{valid_catalog, MarketConditions, MultiplierComponents, Policy, ProductKey};
use crate::error::OnChainError;
use crate::hedge::{HedgeCostFetcher, HedgeMarketData};
use crate::metrics::EngineMetrics;
use crate::onchain::{encode_multiplier_payload, encode_swing_premium_payload, Signer};
use crate::store::PolicyStore;
use crate::cache::MarketConditionsCache;
use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct OracleKeeper {
    store: Arc<dyn PolicyStore>,
    market_cache: MarketConditionsCache,
    hedge_fetcher: HedgeCostFetcher,
    hedge_data: Arc<dyn HedgeMarketData>,
    signer: Arc<dyn Signer>,
    contract_address: Address,
    pricing_settings: PricingSettings,
    settings: KeeperSettings,
    pub metrics: KeeperMetrics,
    engine_metrics: Arc<EngineMetrics>,
    last_full_update_at: RwLock<Option<DateTime<Utc>>>,
    last_update_by_product: RwLock<HashMap<ProductKey, DateTime<Utc>>>,
}

impl OracleKeeper {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn PolicyStore>,
        market_cache: MarketConditionsCache,
        hedge_fetcher: HedgeCostFetcher,
        hedge_data: Arc<dyn HedgeMarketData>,
        signer: Arc<dyn Signer>,
        contract_address: Address,
        pricing_settings: PricingSettings,
        settings: KeeperSettings,
        engine_metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            store,
            market_cache,
            hedge_fetcher,
            hedge_data,
            signer,
            contract_address,
            pricing_settings,
            settings,
            metrics: KeeperMetrics::new(),
            engine_metrics,
            last_full_update_at: RwLock::new(None),
            last_update_by_product: RwLock::new(HashMap::new()),
        }
    }

    /// Runs until `cancel` fires. Each tick of a fixed `tick_interval_secs`
    /// timer runs one iteration, hard-capped at `full_refresh_hard_cap_secs`
    /// (§5 "loop hard caps ... 120s keeper"). A fully-failed iteration
    /// (zero product successes) triggers an extra exponential backoff pause
    /// before the next tick (§7).
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.settings.tick_interval_secs));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("oracle keeper shutting down");
                    return;
                }
                _ = interval.tick() => {
                    let hard_cap = Duration::from_secs(self.settings.full_refresh_hard_cap_secs);
                    match tokio::time::timeout(hard_cap, self.run_iteration()).await {
                        Ok(successes) => {
                            self.metrics.record_iteration_outcome(successes > 0);
                            if successes == 0 {
                                self.backoff_pause().await;
                            }
                        }
                        Err(_) => warn!("oracle keeper iteration exceeded its hard cap"),
                    }
                }
            }
        }
    }

    /// §7 exponential backoff (1s -> 16s cap, reset on success) via the
    /// `backoff` crate, replayed up to `consecutive_failures` steps.
    async fn backoff_pause(&self) {
        let mut backoff = backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_secs(1))
            .with_max_interval(Duration::from_secs(16))
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();
        let n = self.metrics.consecutive_failures().min(4);
        let mut delay = Duration::from_secs(1);
        for _ in 0..n {
            delay = backoff::backoff::Backoff::next_backoff(&mut backoff).unwrap_or(Duration::from_secs(16));
        }
        tokio::time::sleep(delay).await;
    }

    /// One scheduling tick (§4.8): pick a strategy, select the product set
    /// it implies, update every product in batches of `batch_size` run
    /// concurrently within a batch. Returns the number of products
    /// successfully published.
    pub async fn run_iteration(&self) -> usize {
        let (policies, market) = tokio::join!(self.store.all_policies(), self.market_cache.get());
        let market = match market {
            Some(m) => m,
            None => {
                warn!("oracle keeper has no market snapshot yet, skipping iteration");
                return 0;
            }
        };

        let now = Utc::now();
        let last_full = *self.last_full_update_at.read().await;
        let strategy = scheduler::select_strategy(now, last_full, self.settings.full_update_after_secs, self.settings.hot_update_after_secs);

        let products = self.select_products(strategy, &policies).await;

        let strategy_label = strategy.label();
        let mut successes = 0usize;
        for chunk in products.chunks(self.settings.batch_size) {
            let results = join_all(chunk.iter().map(|product| self.update_one_product(*product, &policies, &market))).await;
            for (product, result) in chunk.iter().zip(results) {
                match result {
                    Ok(duration) => {
                        successes += 1;
                        self.metrics.record_product_success(duration).await;
                        self.engine_metrics.keeper_update_success_total.with_label_values(&[strategy_label]).inc();
                        self.last_update_by_product.write().await.insert(*product, Utc::now());
                    }
                    Err(e) => {
                        self.metrics.record_product_failure(e.to_string()).await;
                        self.engine_metrics.keeper_update_failure_total.with_label_values(&[strategy_label]).inc();
                        warn!(product = %product.name(), error = %e, "keeper failed to publish product update");
                    }
                }
            }
        }

        let avg_duration = self.metrics.snapshot().await.avg_update_duration_secs;
        self.engine_metrics.keeper_avg_duration_seconds.with_label_values(&[strategy_label]).set(avg_duration);

        if matches!(strategy, UpdateStrategy::Full) {
            *self.last_full_update_at.write().await = Some(now);
        }
        successes
    }

    async fn select_products(&self, strategy: UpdateStrategy, policies: &[Policy]) -> Vec<ProductKey> {
        match strategy {
            UpdateStrategy::Full => valid_catalog(),
            UpdateStrategy::Hot => {
                let mut by_product = coverage_by_product(policies);
                by_product.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                by_product.into_iter().map(|(k, _)| k).take(self.settings.batch_size).collect()
            }
            UpdateStrategy::Stale => {
                let last_update = self.last_update_by_product.read().await;
                let threshold = chrono::Duration::seconds(self.settings.hot_update_after_secs);
                let now = Utc::now();
                let mut stale: Vec<ProductKey> = valid_catalog()
                    .into_iter()
                    .filter(|p| match last_update.get(p) {
                        None => true,
                        Some(t) => now - *t > threshold,
                    })
                    .collect();
                stale.truncate(self.settings.batch_size);
                stale
            }
        }
    }

    async fn update_one_product(&self, product: ProductKey, policies: &[Policy], market: &MarketConditions) -> Result<Duration, OnChainError> {
        let started = Instant::now();
        let matching: Vec<&Policy> = policies
            .iter()
            .filter(|p| p.coverage_type == product.coverage_type && p.chain == product.chain && p.asset == product.asset)
            .collect();
        let coverage_usd: f64 = matching.iter().map(|p| p.coverage_usd()).sum();
        let duration_days = if matching.is_empty() {
            90.0
        } else {
            matching.iter().map(|p| p.duration_days()).sum::<f64>() / matching.len() as f64
        };

        let components = multiplier::compute_multiplier(product, market);
        if components.circuit_breaker_engaged {
            self.engine_metrics.oracle_circuit_breaker_total.with_label_values(&[&product.name()]).inc();
        }
        let hedge = self.hedge_fetcher.fetch(product, coverage_usd, self.hedge_data.as_ref()).await;
        let base_apr = self.pricing_settings.base_rate(product.asset);
        let swing = multiplier::swing_premium(base_apr, coverage_usd, duration_days, &components, hedge.total_hedge_cost);

        self.publish_multiplier(product, &components).await?;
        self.publish_swing_premium(product, &components, &swing).await?;

        Ok(started.elapsed())
    }

    async fn publish_multiplier(&self, product: ProductKey, components: &MultiplierComponents) -> Result<(), OnChainError> {
        let payload = encode_multiplier_payload(
            product.coverage_type.id(),
            product.chain.id(),
            product.asset.id(),
            components.base_bps as u16,
            components.market_adjustment_bps as i16,
            components.volatility_premium_bps as i16,
        );
        self.submit_and_confirm(&payload).await
    }

    async fn publish_swing_premium(&self, product: ProductKey, components: &MultiplierComponents, swing: &crate::domain::SwingPremium) -> Result<(), OnChainError> {
        let payload = encode_swing_premium_payload(
            product.coverage_type.id(),
            product.chain.id(),
            product.asset.id(),
            crate::pricing::round_half_even_cents(swing.base_premium) as i32,
            crate::pricing::round_half_even_cents(swing.hedge_costs) as i32,
            components.total_bps as u16,
            crate::pricing::round_half_even_cents(swing.total_premium) as i32,
            swing.timestamp.timestamp() as u64,
        );
        self.submit_and_confirm(&payload).await
    }

    async fn submit_and_confirm(&self, payload: &[u8]) -> Result<(), OnChainError> {
        let tx_hash = self.signer.submit(self.contract_address, payload).await?;
        for _ in 0..self.settings.confirmation_poll_attempts {
            let receipt = self.signer.poll_confirmation(tx_hash).await?;
            if receipt.is_success() {
                return Ok(());
            }
            if receipt.exit_code != 0 {
                return Err(OnChainError::NonZeroExit(receipt.exit_code));
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        Err(OnChainError::ConfirmationTimeout)
    }
}

fn coverage_by_product(policies: &[Policy]) -> Vec<(ProductKey, f64)> {
    let mut by_product: HashMap<ProductKey, f64> = HashMap::new();
    for p in policies {
        let key = ProductKey::new(p.coverage_type, p.chain, p.asset);
        *by_product.entry(key).or_insert(0.0) += p.coverage_usd();
    }
    by_product.into_iter().collect()
}
