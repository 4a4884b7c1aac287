use super::Asset;
use crate::domain::chain::Blockchain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Consensus price for one stablecoin, produced by `OracleAggregator`
/// (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusPrice {
    pub asset: Asset,
    pub median_price: f64,
    pub sources: Vec<(String, f64)>,
    pub confidence: f64,
}

/// Point-in-time snapshot produced atomically by the oracle/data layer
/// (§3). Feeds both the keeper's multiplier computation and the monitor's
/// portfolio risk model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConditions {
    pub stablecoin_prices: HashMap<Asset, (f64, f64)>,
    pub bridge_health_scores: HashMap<String, f64>,
    pub cex_liquidation_rate: f64,
    pub chain_gas_prices: HashMap<Blockchain, f64>,
    pub protocol_exploit_count_24h: u32,
    pub overall_volatility_index: f64,
    pub timestamp: DateTime<Utc>,
}

impl MarketConditions {
    pub fn price_of(&self, asset: Asset) -> Option<(f64, f64)> {
        self.stablecoin_prices.get(&asset).copied()
    }

    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_seconds().max(0)
    }

    pub fn is_stale(&self, now: DateTime<Utc>, validity_window_secs: i64) -> bool {
        self.age_seconds(now) > validity_window_secs
    }
}

/// Per-venue hedge cost for one product, aggregated by `HedgeCostFetcher`
/// (§4.4). A `None` component means no hedge market exists for that venue
/// and coverage type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeCostBreakdown {
    pub polymarket: Option<f64>,
    pub hyperliquid: Option<f64>,
    pub binance: Option<f64>,
    pub allianz: Option<f64>,
    pub total_hedge_cost: f64,
    pub hedge_ratio: f64,
    pub effective_premium_addition: f64,
    pub timestamp: DateTime<Utc>,
}

impl HedgeCostBreakdown {
    /// Conservation invariant (§8): the total equals the sum of the present
    /// venue costs.
    pub fn conserves(&self) -> bool {
        let sum = [self.polymarket, self.hyperliquid, self.binance, self.allianz]
            .into_iter()
            .flatten()
            .sum::<f64>();
        (sum - self.total_hedge_cost).abs() < 1e-6
    }
}

/// Real-time pricing output for one product (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingPremium {
    pub base_premium: f64,
    pub hedge_costs: f64,
    pub risk_multiplier: f64,
    pub total_premium: f64,
    pub timestamp: DateTime<Utc>,
}

/// Clamped multiplier composed from market/volatility adjustments for one
/// product (§3, §4.8). `total_bps` always reflects the circuit-breaker
/// clamp to `[5000, 20000]` before it is returned to a caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultiplierComponents {
    pub base_bps: i32,
    pub market_adjustment_bps: i32,
    pub volatility_premium_bps: i32,
    pub total_bps: i32,
    /// Whether any of the three clamps in `combine` (§4.8 circuit breaker)
    /// actually changed a raw value; drives `oracle_circuit_breaker_total`.
    pub circuit_breaker_engaged: bool,
}

impl MultiplierComponents {
    pub const BASE_BPS: i32 = 10_000;

    pub fn in_range(&self) -> bool {
        (-3000..=3000).contains(&self.market_adjustment_bps)
            && (0..=5000).contains(&self.volatility_premium_bps)
            && (5000..=20000).contains(&self.total_bps)
    }
}
