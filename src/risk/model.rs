//! Risk Model (§4.6, component C6). Pure functions over a policy set and
//! market inputs; no I/O, failures limited to `MathError` (§4.6, §7).

use crate::domain::{Asset, Blockchain, CorrelationGroup, CorrelationRegime, MarketConditions, Policy, StressResult};
use crate::error::MathError;
use std::collections::HashMap;

const VAR_K_95: f64 = 1.5;
const VAR_K_99: f64 = 2.0;
const CVAR_MULTIPLIER: f64 = 1.3;

/// Per-asset share of total coverage (§4.6 "Concentration").
pub fn concentration_by_asset(policies: &[Policy]) -> HashMap<Asset, f64> {
    concentration_by(policies, |p| p.asset)
}

/// Per-chain share of total coverage, same shape as `concentration_by_asset`.
pub fn concentration_by_chain(policies: &[Policy]) -> HashMap<Blockchain, f64> {
    concentration_by(policies, |p| p.chain)
}

fn concentration_by<K: std::hash::Hash + Eq + Copy>(
    policies: &[Policy],
    key_of: impl Fn(&Policy) -> K,
) -> HashMap<K, f64> {
    let total: f64 = policies.iter().map(Policy::coverage_usd).sum();
    let mut by_key: HashMap<K, f64> = HashMap::new();
    for p in policies {
        *by_key.entry(key_of(p)).or_insert(0.0) += p.coverage_usd();
    }
    if total <= 0.0 {
        return by_key.into_keys().map(|k| (k, 0.0)).collect();
    }
    by_key.into_iter().map(|(k, v)| (k, v / total)).collect()
}

/// Worst correlated-group exposure share per asset (§4.6 "Correlated
/// exposure"): for each asset in a named group, the group's cumulative
/// share of total coverage. Assets outside any named group get their own
/// concentration share.
pub fn correlated_exposure(policies: &[Policy]) -> HashMap<Asset, f64> {
    let by_asset = concentration_by_asset(policies);
    let mut group_totals: HashMap<u8, f64> = HashMap::new();
    for (asset, share) in &by_asset {
        if let Some(group) = asset.correlation_group() {
            *group_totals.entry(group_tag(group)).or_insert(0.0) += share;
        }
    }
    by_asset
        .into_iter()
        .map(|(asset, share)| match asset.correlation_group() {
            Some(group) => (asset, group_totals[&group_tag(group)]),
            None => (asset, share),
        })
        .collect()
}

fn group_tag(group: CorrelationGroup) -> u8 {
    match group {
        CorrelationGroup::FiatBacked => 0,
        CorrelationGroup::CryptoCollateralized => 1,
        CorrelationGroup::YieldBearing => 2,
    }
}

/// Pairwise Pearson correlation over log-returns of the supplied price
/// histories (§4.6 "Correlation matrix"), plus the bucketed regime. Every
/// history must have at least 2 points (1 log-return); fewer is a
/// `MathError`.
pub fn correlation_matrix(
    price_histories: &HashMap<Asset, Vec<f64>>,
) -> Result<(HashMap<(Asset, Asset), f64>, CorrelationRegime), MathError> {
    if price_histories.len() < 2 {
        return Err(MathError("need at least two price histories for a correlation matrix".to_string()));
    }
    let mut log_returns: HashMap<Asset, Vec<f64>> = HashMap::new();
    for (asset, prices) in price_histories {
        if prices.len() < 2 {
            return Err(MathError(format!("{asset} has fewer than 2 price points")));
        }
        let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        log_returns.insert(*asset, returns);
    }

    let assets: Vec<Asset> = log_returns.keys().copied().collect();
    let mut matrix = HashMap::new();
    let mut abs_sum = 0.0;
    let mut pair_count = 0usize;

    for i in 0..assets.len() {
        for j in (i + 1)..assets.len() {
            let a = assets[i];
            let b = assets[j];
            let rho = pearson(&log_returns[&a], &log_returns[&b])?;
            matrix.insert((a, b), rho);
            matrix.insert((b, a), rho);
            abs_sum += rho.abs();
            pair_count += 1;
        }
    }
    for asset in &assets {
        matrix.insert((*asset, *asset), 1.0);
    }

    let mean_abs_rho = if pair_count == 0 { 0.0 } else { abs_sum / pair_count as f64 };
    Ok((matrix, CorrelationRegime::from_mean_abs_correlation(mean_abs_rho)))
}

fn pearson(a: &[f64], b: &[f64]) -> Result<f64, MathError> {
    let n = a.len().min(b.len());
    if n < 2 {
        return Err(MathError("need at least 2 observations for correlation".to_string()));
    }
    let a = &a[..n];
    let b = &b[..n];
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return Err(MathError("degenerate correlation: zero variance series".to_string()));
    }
    Ok((cov / denom).clamp(-1.0, 1.0))
}

/// Closed-form VaR/CVaR approximation (§4.6, §9 Open Questions: the closed
/// form is chosen here over Monte Carlo for determinism and test
/// reproducibility; both are acceptable per the design notes).
pub fn value_at_risk(total_coverage: f64, avg_depeg_prob_95: f64, avg_depeg_prob_99: f64, avg_severity: f64) -> (f64, f64, f64) {
    let var_95 = total_coverage * avg_depeg_prob_95 * avg_severity * VAR_K_95;
    let var_99 = total_coverage * avg_depeg_prob_99 * avg_severity * VAR_K_99;
    let cvar_95 = var_95 * CVAR_MULTIPLIER;
    (var_95, var_99, cvar_95)
}

/// Expected loss for one policy (§4.6): `coverage * depeg_prob * severity`.
pub fn expected_loss_per_policy(policy: &Policy, depeg_prob: f64, severity_given_depeg: f64) -> f64 {
    policy.coverage_usd() * depeg_prob * severity_given_depeg
}

/// Named deterministic stress scenarios (§4.6), reproducible given the same
/// policy set and market snapshot.
pub fn stress_test_suite(policies: &[Policy], market: &MarketConditions) -> Vec<StressResult> {
    let total_coverage: f64 = policies.iter().map(Policy::coverage_usd).sum();
    let by_asset = concentration_by_asset(policies);
    let by_chain = concentration_by_chain(policies);

    let stable_depeg_10pct = total_coverage * 0.10 * 0.60;

    let worst_chain_share = by_chain.values().cloned().fold(0.0, f64::max);
    let bridge_health_floor = market
        .bridge_health_scores
        .values()
        .cloned()
        .fold(1.0, f64::min);
    let bridge_exploit = total_coverage * worst_chain_share * (1.0 - bridge_health_floor).max(0.3);

    let worst_group_share = correlated_exposure(policies).into_values().fold(0.0, f64::max);
    let correlated_depeg = total_coverage * worst_group_share * 0.50;

    let fiat_backed_share: f64 = by_asset
        .iter()
        .filter(|(a, _)| matches!(a.correlation_group(), Some(CorrelationGroup::FiatBacked)))
        .map(|(_, share)| share)
        .sum();
    let reserve_run = total_coverage * fiat_backed_share * 0.25;

    vec![
        StressResult { name: "stable_depeg_10pct".to_string(), loss_usd: stable_depeg_10pct },
        StressResult { name: "bridge_exploit".to_string(), loss_usd: bridge_exploit },
        StressResult { name: "correlated_depeg".to_string(), loss_usd: correlated_depeg },
        StressResult { name: "reserve_run".to_string(), loss_usd: reserve_run },
    ]
}

pub fn worst_case_stress(results: &[StressResult]) -> f64 {
    results.iter().map(|r| r.loss_usd).fold(0.0, f64::max)
}

/// Mean absolute pairwise correlation from a matrix produced by
/// `correlation_matrix`, used for the §4.7 correlation threshold checks
/// (the regime bucket alone doesn't carry the raw value thresholds need).
pub fn mean_abs_correlation(matrix: &HashMap<(Asset, Asset), f64>) -> f64 {
    let off_diagonal: Vec<f64> = matrix
        .iter()
        .filter(|((a, b), _)| a != b)
        .map(|(_, rho)| rho.abs())
        .collect();
    if off_diagonal.is_empty() {
        0.0
    } else {
        off_diagonal.iter().sum::<f64>() / off_diagonal.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Blockchain, CoverageType, Policy, PolicyStatus};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn policy(asset: Asset, chain: Blockchain, coverage_cents: u64) -> Policy {
        let now = Utc::now();
        Policy {
            id: Uuid::new_v4(),
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

    #[test]
    fn concentration_sums_to_one() {
        let policies = vec![
            policy(Asset::Usdc, Blockchain::Ethereum, 60_000_00),
            policy(Asset::Usdt, Blockchain::Ethereum, 40_000_00),
        ];
        let by_asset = concentration_by_asset(&policies);
        let total: f64 = by_asset.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((by_asset[&Asset::Usdc] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn scenario_5_high_correlation_regime() {
        let mut histories = HashMap::new();
        histories.insert(Asset::Usdc, vec![1.00, 0.99, 0.98, 0.97, 0.96]);
        histories.insert(Asset::Usdt, vec![1.00, 0.99, 0.98, 0.97, 0.96]);
        let (_, regime) = correlation_matrix(&histories).unwrap();
        assert_eq!(regime, CorrelationRegime::High);
    }

    #[test]
    fn var_99_exceeds_var_95_for_same_inputs() {
        let (var_95, var_99, cvar_95) = value_at_risk(1_000_000.0, 0.02, 0.02, 0.5);
        assert!(var_99 > var_95);
        assert!(cvar_95 > var_95);
    }

    #[test]
    fn stress_suite_is_deterministic() {
        let policies = vec![policy(Asset::Usdc, Blockchain::Ethereum, 100_000_00)];
        let market = MarketConditions {
            stablecoin_prices: HashMap::new(),
            bridge_health_scores: HashMap::new(),
            cex_liquidation_rate: 0.0,
            chain_gas_prices: HashMap::new(),
            protocol_exploit_count_24h: 0,
            overall_volatility_index: 0.1,
            timestamp: Utc::now(),
        };
        let a = stress_test_suite(&policies, &market);
        let b = stress_test_suite(&policies, &market);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.name, y.name);
            assert!((x.loss_usd - y.loss_usd).abs() < 1e-9);
        }
    }
}
