//! Portfolio risk data model (§3 `RiskSnapshot`). Produced once per Risk
//! Monitor iteration (§4.7) and immutable thereafter.

use super::{Alert, Asset, Blockchain, ProductKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mean pairwise correlation bucketed into a regime (§4.6): High > 0.70,
/// Medium > 0.40, else Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationRegime {
    Low,
    Medium,
    High,
}

impl CorrelationRegime {
    pub fn from_mean_abs_correlation(mean_abs_rho: f64) -> Self {
        if mean_abs_rho > 0.70 {
            CorrelationRegime::High
        } else if mean_abs_rho > 0.40 {
            CorrelationRegime::Medium
        } else {
            CorrelationRegime::Low
        }
    }

    /// Multiplier applied at the pricing-integration seam (§4.7
    /// `risk_adjusted_multiplier`, §8 scenario 5: High -> 1.3).
    pub fn pricing_multiplier(self) -> f64 {
        match self {
            CorrelationRegime::High => 1.3,
            CorrelationRegime::Medium => 1.15,
            CorrelationRegime::Low => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressResult {
    pub name: String,
    pub loss_usd: f64,
}

/// Portfolio-level risk record (§3), assembled once per monitor iteration
/// and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub var_95: f64,
    pub var_99: f64,
    pub cvar_95: f64,
    pub expected_loss: f64,
    pub worst_case_stress_usd: f64,
    pub stress_results: Vec<StressResult>,
    pub ltv: f64,
    pub reserve_ratio: f64,
    pub utilization_by_product: HashMap<u32, f64>,
    pub asset_concentration: HashMap<Asset, f64>,
    pub chain_concentration: HashMap<Blockchain, f64>,
    pub bridge_exposure: f64,
    pub exposure_by_product: HashMap<u32, f64>,
    pub top_10_products: Vec<(ProductKey, f64)>,
    pub correlation_matrix: HashMap<(Asset, Asset), f64>,
    pub correlation_regime: CorrelationRegime,
    pub active_policy_count: usize,
    pub expired_policy_count: usize,
    pub alerts: Vec<Alert>,
    pub timestamp: DateTime<Utc>,
}

impl RiskSnapshot {
    /// True once any input needed for VaR was entirely unavailable (§7:
    /// "VaR fields are set to NaN" when every source for a critical input
    /// fails).
    pub fn var_unavailable(&self) -> bool {
        self.var_95.is_nan() || self.var_99.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_regime_buckets() {
        assert_eq!(CorrelationRegime::from_mean_abs_correlation(0.85), CorrelationRegime::High);
        assert_eq!(CorrelationRegime::from_mean_abs_correlation(0.50), CorrelationRegime::Medium);
        assert_eq!(CorrelationRegime::from_mean_abs_correlation(0.10), CorrelationRegime::Low);
    }

    #[test]
    fn scenario_5_high_regime_multiplier() {
        assert_eq!(CorrelationRegime::High.pricing_multiplier(), 1.3);
    }
}
