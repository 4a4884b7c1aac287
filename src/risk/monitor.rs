//! Risk Monitor (§4.7, component C7). A cooperative loop: each iteration
//! reads the policy set and the last-known market snapshot, runs the risk
//! model concurrently, assembles an immutable `RiskSnapshot`, and emits
//! threshold-breach alerts through an injected sink.

use crate::cache::MarketConditionsCache;
use crate::config::{MonitorSettings, RiskThresholds};
use crate::domain::{
    Alert, AlertKind, AlertSeverity, Asset, CorrelationRegime, MarketConditions, Policy, RiskSnapshot,
};
use crate::pricing::PricingRequest;
use crate::risk::model;
use crate::scheduling::alert_sink::deliver;
use crate::scheduling::AlertSink;
use crate::store::PolicyStore;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct RiskMonitor {
    store: Arc<dyn PolicyStore>,
    market_cache: MarketConditionsCache,
    sink: Arc<dyn AlertSink>,
    thresholds: RiskThresholds,
    settings: MonitorSettings,
    last_snapshot: RwLock<Option<RiskSnapshot>>,
}

impl RiskMonitor {
    pub fn new(
        store: Arc<dyn PolicyStore>,
        market_cache: MarketConditionsCache,
        sink: Arc<dyn AlertSink>,
        thresholds: RiskThresholds,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            store,
            market_cache,
            sink,
            thresholds,
            settings,
            last_snapshot: RwLock::new(None),
        }
    }

    pub async fn last_snapshot(&self) -> Option<RiskSnapshot> {
        self.last_snapshot.read().await.clone()
    }

    /// Runs until `cancel` fires (§4.7 "Cancellation"). Each iteration is
    /// bounded by `iteration_hard_cap_secs`; an overrun is logged and the
    /// next iteration starts immediately (§4.7 "Ordering": no queue
    /// backlog).
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(self.settings.check_interval_secs));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("risk monitor shutting down");
                    return;
                }
                _ = interval.tick() => {
                    let hard_cap = std::time::Duration::from_secs(self.settings.iteration_hard_cap_secs);
                    match tokio::time::timeout(hard_cap, self.run_iteration()).await {
                        Ok(snapshot) => {
                            for alert in &snapshot.alerts {
                                deliver(self.sink.as_ref(), alert).await;
                            }
                            *self.last_snapshot.write().await = Some(snapshot);
                        }
                        Err(_) => warn!("risk monitor iteration exceeded its hard cap"),
                    }
                }
            }
        }
    }

    /// One full iteration (§4.7 steps 1-4): fetch, compute concurrently,
    /// assemble, threshold-check. Never suspends inside the pure numeric
    /// portion (§5).
    pub async fn run_iteration(&self) -> RiskSnapshot {
        let (policies, market) = tokio::join!(self.store.all_policies(), self.market_cache.get());
        let market = market.unwrap_or_else(empty_market_conditions);

        let assets: Vec<Asset> = {
            let mut seen = std::collections::HashSet::new();
            policies
                .iter()
                .map(|p| p.asset)
                .filter(|a| seen.insert(*a))
                .collect()
        };
        let histories: HashMap<Asset, Vec<f64>> = join_all(assets.iter().map(|a| {
            let store = Arc::clone(&self.store);
            let asset = *a;
            async move { (asset, store.price_history(asset).await) }
        }))
        .await
        .into_iter()
        .collect();

        let (var_result, stress_results, correlation_result) = tokio::join!(
            async { self.compute_var(&policies, &market) },
            async { model::stress_test_suite(&policies, &market) },
            async { model::correlation_matrix(&histories) },
        );

        let (var_95, var_99, cvar_95) = var_result;
        let expected_loss = self.compute_expected_loss(&policies, &market);
        let worst_case_stress_usd = model::worst_case_stress(&stress_results);

        let (correlation_matrix, correlation_regime) = match correlation_result {
            Ok((matrix, regime)) => (matrix, regime),
            Err(_) => (HashMap::new(), CorrelationRegime::Low),
        };

        let total_coverage: f64 = policies.iter().map(Policy::coverage_usd).sum();
        let total_capital = reference_capital(&policies);
        let ltv = if total_capital > 0.0 { (total_coverage / total_capital).min(1.0) } else { 0.0 };
        let reserve_ratio = 1.0 - ltv;

        let asset_concentration = model::concentration_by_asset(&policies);
        let chain_concentration = model::concentration_by_chain(&policies);
        let bridge_exposure = market.bridge_health_scores.values().cloned().fold(1.0_f64, f64::min);

        let exposure_by_product = exposure_by_product(&policies);
        let mut top_10_products: Vec<_> = exposure_by_product
            .iter()
            .map(|(hash, usd)| (crate::domain::ProductKey::decompose(*hash), *usd))
            .filter_map(|(key, usd)| key.map(|k| (k, usd)))
            .collect();
        top_10_products.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        top_10_products.truncate(10);

        let active = policies.iter().filter(|p| matches!(p.status, crate::domain::PolicyStatus::Active)).count();
        let expired = policies.iter().filter(|p| matches!(p.status, crate::domain::PolicyStatus::Expired)).count();

        let mut timestamp = chrono::Utc::now();
        if let Some(last) = self.last_snapshot.read().await.as_ref() {
            if timestamp <= last.timestamp {
                timestamp = last.timestamp + chrono::Duration::microseconds(1);
            }
        }

        let mean_abs_rho = model::mean_abs_correlation(&correlation_matrix);
        let alerts = self.check_thresholds(ltv, reserve_ratio, &asset_concentration, &chain_concentration, mean_abs_rho, &market);

        RiskSnapshot {
            var_95,
            var_99,
            cvar_95,
            expected_loss,
            worst_case_stress_usd,
            stress_results,
            ltv,
            reserve_ratio,
            utilization_by_product: HashMap::new(),
            asset_concentration,
            chain_concentration,
            bridge_exposure,
            exposure_by_product,
            top_10_products,
            correlation_matrix,
            correlation_regime,
            active_policy_count: active,
            expired_policy_count: expired,
            alerts,
            timestamp,
        }
    }

    /// §7: "If all sources for a critical input fail ... VaR fields are
    /// set to NaN." An empty stablecoin-price snapshot is that condition.
    fn compute_var(&self, policies: &[Policy], market: &MarketConditions) -> (f64, f64, f64) {
        if market.stablecoin_prices.is_empty() {
            return (f64::NAN, f64::NAN, f64::NAN);
        }
        let total_coverage: f64 = policies.iter().map(Policy::coverage_usd).sum();
        let avg_deviation = market
            .stablecoin_prices
            .values()
            .map(|(price, _confidence)| (1.0 - price).abs())
            .sum::<f64>()
            / market.stablecoin_prices.len() as f64;
        let avg_depeg_prob_95 = (avg_deviation * 10.0).clamp(0.0, 1.0);
        let avg_depeg_prob_99 = (avg_deviation * 15.0).clamp(0.0, 1.0);
        let avg_severity = 0.5;
        model::value_at_risk(total_coverage, avg_depeg_prob_95, avg_depeg_prob_99, avg_severity)
    }

    fn compute_expected_loss(&self, policies: &[Policy], market: &MarketConditions) -> f64 {
        if market.stablecoin_prices.is_empty() {
            return f64::NAN;
        }
        policies
            .iter()
            .map(|p| {
                let (price, _confidence) = market.stablecoin_prices.get(&p.asset).copied().unwrap_or((1.0, 0.0));
                let depeg_prob = (1.0 - price).abs().clamp(0.0, 1.0);
                model::expected_loss_per_policy(p, depeg_prob, 0.5)
            })
            .sum()
    }

    fn check_thresholds(
        &self,
        ltv: f64,
        reserve_ratio: f64,
        asset_concentration: &HashMap<Asset, f64>,
        chain_concentration: &HashMap<crate::domain::Blockchain, f64>,
        mean_abs_rho: f64,
        market: &MarketConditions,
    ) -> Vec<Alert> {
        let t = &self.thresholds;
        let mut alerts = Vec::new();

        if ltv > t.ltv_crit {
            alerts.push(Alert::new(AlertKind::LtvBreach, AlertSeverity::Critical, format!("LTV {ltv:.4} exceeds critical threshold"), ltv, t.ltv_crit));
        } else if ltv > t.ltv_warn {
            alerts.push(Alert::new(AlertKind::LtvBreach, AlertSeverity::Medium, format!("LTV {ltv:.4} exceeds warning threshold"), ltv, t.ltv_warn));
        }

        if reserve_ratio < t.reserve_crit {
            alerts.push(Alert::new(AlertKind::ReserveRatioBreach, AlertSeverity::Critical, format!("reserve ratio {reserve_ratio:.4} below critical floor"), reserve_ratio, t.reserve_crit));
        } else if reserve_ratio < t.reserve_warn {
            alerts.push(Alert::new(AlertKind::ReserveRatioBreach, AlertSeverity::Medium, format!("reserve ratio {reserve_ratio:.4} below warning floor"), reserve_ratio, t.reserve_warn));
        }

        for (asset, share) in asset_concentration {
            if *share > t.concentration_crit {
                alerts.push(Alert::new(AlertKind::ConcentrationBreach { group: asset.to_string() }, AlertSeverity::Critical, format!("{asset} concentration {share:.4} exceeds critical threshold"), *share, t.concentration_crit));
            } else if *share > t.concentration_warn {
                alerts.push(Alert::new(AlertKind::ConcentrationBreach { group: asset.to_string() }, AlertSeverity::Medium, format!("{asset} concentration {share:.4} exceeds warning threshold"), *share, t.concentration_warn));
            }
        }
        for (chain, share) in chain_concentration {
            if *share > t.concentration_crit {
                alerts.push(Alert::new(AlertKind::ConcentrationBreach { group: chain.to_string() }, AlertSeverity::Critical, format!("{chain} concentration {share:.4} exceeds critical threshold"), *share, t.concentration_crit));
            } else if *share > t.concentration_warn {
                alerts.push(Alert::new(AlertKind::ConcentrationBreach { group: chain.to_string() }, AlertSeverity::Medium, format!("{chain} concentration {share:.4} exceeds warning threshold"), *share, t.concentration_warn));
            }
        }

        if mean_abs_rho > t.correlation_crit {
            alerts.push(Alert::new(AlertKind::CorrelationRegimeBreach, AlertSeverity::Critical, format!("mean |correlation| {mean_abs_rho:.4} exceeds critical threshold"), mean_abs_rho, t.correlation_crit));
        } else if mean_abs_rho > t.correlation_warn {
            alerts.push(Alert::new(AlertKind::CorrelationRegimeBreach, AlertSeverity::Medium, format!("mean |correlation| {mean_abs_rho:.4} exceeds warning threshold"), mean_abs_rho, t.correlation_warn));
        }

        let now = chrono::Utc::now();
        if market.is_stale(now, t.oracle_staleness_secs) {
            let age = market.age_seconds(now);
            alerts.push(Alert::new(
                AlertKind::PriceStale { asset: "portfolio".to_string(), age_seconds: age },
                AlertSeverity::High,
                format!("market snapshot is {age}s old, exceeding the {0}s staleness threshold", t.oracle_staleness_secs),
                age as f64,
                t.oracle_staleness_secs as f64,
            ));
        }

        if market.stablecoin_prices.is_empty() {
            alerts.push(Alert::new(
                AlertKind::AllSourcesUnavailable { input: "stablecoin_prices".to_string() },
                AlertSeverity::Critical,
                "every stablecoin price source failed this iteration",
                0.0,
                0.0,
            ));
        }

        alerts
    }

    /// Multiplicative portfolio-level risk adjustment applied on top of the
    /// per-policy pricing composition (§4.7 `risk_adjusted_multiplier`):
    /// LTV, concentration, correlation regime and reserve ratio each
    /// contribute a factor, composed the same left-to-right way §4.3 does.
    pub fn risk_adjusted_multiplier(&self, snapshot: &RiskSnapshot, request: &PricingRequest) -> f64 {
        let ltv_factor = if snapshot.ltv > self.thresholds.ltv_crit {
            1.5
        } else if snapshot.ltv > self.thresholds.ltv_warn {
            1.2
        } else {
            1.0
        };

        let concentration = snapshot.asset_concentration.get(&request.asset).copied().unwrap_or(0.0);
        let concentration_factor = if concentration > self.thresholds.concentration_crit {
            1.4
        } else if concentration > self.thresholds.concentration_warn {
            1.15
        } else {
            1.0
        };

        let correlation_factor = snapshot.correlation_regime.pricing_multiplier();

        let reserve_factor = if snapshot.reserve_ratio < self.thresholds.reserve_crit {
            1.3
        } else if snapshot.reserve_ratio < self.thresholds.reserve_warn {
            1.1
        } else {
            1.0
        };

        ltv_factor * concentration_factor * correlation_factor * reserve_factor
    }
}

fn exposure_by_product(policies: &[Policy]) -> HashMap<u32, f64> {
    let mut out = HashMap::new();
    for p in policies {
        let key = crate::domain::ProductKey::new(p.coverage_type, p.chain, p.asset);
        *out.entry(key.hash()).or_insert(0.0) += p.coverage_usd();
    }
    out
}

/// Coverage-weighted reference capital stand-in used only to derive an LTV
/// when no external vault-capital figure is supplied to the monitor; real
/// capital comes from the vault contracts the pricing engine already takes
/// as `VaultState` (out of scope for this loop, §1).
fn reference_capital(policies: &[Policy]) -> f64 {
    let total: f64 = policies.iter().map(Policy::coverage_usd).sum();
    (total / 0.5).max(total)
}

fn empty_market_conditions() -> MarketConditions {
    MarketConditions {
        stablecoin_prices: HashMap::new(),
        bridge_health_scores: HashMap::new(),
        cex_liquidation_rate: 0.0,
        chain_gas_prices: HashMap::new(),
        protocol_exploit_count_24h: 0,
        overall_volatility_index: 0.0,
        timestamp: chrono::Utc::now() - chrono::Duration::days(3650),
    }
}
