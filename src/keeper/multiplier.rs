//! Per-product multiplier and swing-premium math (§4.8). Pure functions:
//! no I/O, no suspension, mirroring the Risk Model's purity discipline.

use crate::domain::{Blockchain, MarketConditions, MultiplierComponents, ProductKey, SwingPremium};
use chrono::Utc;

fn stablecoin_adjustment_bps(price: f64) -> i32 {
    let deviation = (1.0 - price).abs();
    if deviation > 0.03 {
        400
    } else if deviation > 0.02 {
        250
    } else if deviation > 0.01 {
        150
    } else {
        -100
    }
}

/// Bridge coverage adjustment (§4.8). `MarketConditions::bridge_health_scores`
/// is keyed by bridge name rather than chain, so this uses the worst
/// tracked score as the portfolio-wide bridge-risk input, the same floor
/// the stress-test suite uses for its bridge-exploit scenario.
fn bridge_adjustment_bps(bridge_health_floor: Option<f64>) -> i32 {
    match bridge_health_floor {
        None => 200,
        Some(h) if h < 0.5 => 600,
        Some(h) if h < 0.7 => 300,
        Some(h) if h > 0.9 => -100,
        Some(_) => 0,
    }
}

fn cex_adjustment_bps(liquidation_rate_per_hour: f64) -> i32 {
    if liquidation_rate_per_hour > 100.0 {
        500
    } else if liquidation_rate_per_hour > 50.0 {
        250
    } else {
        -50
    }
}

fn gas_adjustment_bps(chain: Blockchain, gas_gwei: Option<f64>) -> i32 {
    if chain != Blockchain::Ethereum {
        return 0;
    }
    match gas_gwei {
        Some(g) if g > 200.0 => 150,
        Some(g) if g > 100.0 => 75,
        _ => 0,
    }
}

fn exploit_adjustment_bps(count_24h: u32) -> i32 {
    if count_24h > 2 {
        200
    } else if count_24h > 0 {
        100
    } else {
        0
    }
}

/// Sum of the five category adjustments before the ±3000 bps circuit
/// breaker is applied (§4.8). Kept separate from the clamp so the clamp's
/// own behavior can be tested against synthetic inputs independent of
/// whether the five categories can ever naturally drive the sum past the
/// cap (they cannot: worst case is 400+600+500+150+200 = 1850 bps).
pub fn raw_market_adjustment_bps(product: ProductKey, market: &MarketConditions) -> i32 {
    let price = market.price_of(product.asset).map(|(p, _)| p).unwrap_or(1.0);
    let bridge_health_floor = market.bridge_health_scores.values().cloned().fold(None, |acc: Option<f64>, h| {
        Some(acc.map_or(h, |a: f64| a.min(h)))
    });
    let gas = market.chain_gas_prices.get(&product.chain).copied();

    stablecoin_adjustment_bps(price)
        + bridge_adjustment_bps(bridge_health_floor)
        + cex_adjustment_bps(market.cex_liquidation_rate)
        + gas_adjustment_bps(product.chain, gas)
        + exploit_adjustment_bps(market.protocol_exploit_count_24h)
}

pub fn raw_volatility_premium_bps(vol_index: f64) -> i32 {
    (vol_index.max(0.0) * 5000.0).round() as i32
}

/// Applies the §4.8 circuit breaker: market adjustment clamped to
/// `[-3000, 3000]`, volatility premium clamped to `[0, 5000]`, and the
/// total clamped to `[5000, 20000]` before publishing (§3 `MultiplierComponents`
/// invariant).
pub fn combine(raw_market_adjustment_bps: i32, raw_volatility_premium_bps: i32) -> MultiplierComponents {
    let market_adjustment_bps = raw_market_adjustment_bps.clamp(-3000, 3000);
    let volatility_premium_bps = raw_volatility_premium_bps.clamp(0, 5000);
    let raw_total = MultiplierComponents::BASE_BPS + market_adjustment_bps + volatility_premium_bps;
    let total_bps = raw_total.clamp(5000, 20000);
    let circuit_breaker_engaged =
        market_adjustment_bps != raw_market_adjustment_bps || volatility_premium_bps != raw_volatility_premium_bps || total_bps != raw_total;
    MultiplierComponents {
        base_bps: MultiplierComponents::BASE_BPS,
        market_adjustment_bps,
        volatility_premium_bps,
        total_bps,
        circuit_breaker_engaged,
    }
}

pub fn compute_multiplier(product: ProductKey, market: &MarketConditions) -> MultiplierComponents {
    combine(raw_market_adjustment_bps(product, market), raw_volatility_premium_bps(market.overall_volatility_index))
}

/// Swing premium for one product (§4.8): `base = coverage·APR·days/365`,
/// risk-adjusted by `total_bps/10000`, plus the hedge cost total from §4.4.
pub fn swing_premium(base_apr: f64, coverage_usd: f64, duration_days: f64, multiplier: &MultiplierComponents, total_hedge_cost: f64) -> SwingPremium {
    let base_premium = coverage_usd * base_apr * duration_days / 365.0;
    let risk_multiplier = multiplier.total_bps as f64 / 10_000.0;
    let risk_adjusted = base_premium * risk_multiplier;
    let total_premium = risk_adjusted + total_hedge_cost;
    SwingPremium {
        base_premium,
        hedge_costs: total_hedge_cost,
        risk_multiplier,
        total_premium,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, CoverageType};
    use std::collections::HashMap;

    fn market(price: f64, bridge_health: f64, gas_gwei: f64, exploits: u32, vol_index: f64) -> MarketConditions {
        let mut stablecoin_prices = HashMap::new();
        stablecoin_prices.insert(Asset::Usdc, (price, 0.9));
        let mut bridge_health_scores = HashMap::new();
        bridge_health_scores.insert("wormhole".to_string(), bridge_health);
        let mut chain_gas_prices = HashMap::new();
        chain_gas_prices.insert(Blockchain::Ethereum, gas_gwei);
        MarketConditions {
            stablecoin_prices,
            bridge_health_scores,
            cex_liquidation_rate: 0.0,
            chain_gas_prices,
            protocol_exploit_count_24h: exploits,
            overall_volatility_index: vol_index,
            timestamp: Utc::now(),
        }
    }

    /// §8 scenario 3 literal inputs: USDC price 0.90, bridge health 0.4,
    /// gas 250 gwei, 3 exploits in 24h, vol_index 1.0. The per-category
    /// bracket sum is 400+600+150+200=1350 bps (matching the scenario's
    /// own stated intermediate figure) — well under the ±3000 bps cap, so
    /// the cap does not engage here; see DESIGN.md for why this diverges
    /// from the scenario's stated 18000 total.
    #[test]
    fn scenario_3_raw_adjustment_matches_bracket_sum() {
        let product = ProductKey::new(CoverageType::Depeg, Blockchain::Ethereum, Asset::Usdc);
        let market = market(0.90, 0.4, 250.0, 3, 1.0);
        let raw = raw_market_adjustment_bps(product, &market);
        assert_eq!(raw, 1350);

        let multiplier = compute_multiplier(product, &market);
        assert_eq!(multiplier.market_adjustment_bps, 1350);
        assert_eq!(multiplier.volatility_premium_bps, 5000);
        assert_eq!(multiplier.total_bps, 16_350);
    }

    #[test]
    fn circuit_breaker_clamps_market_adjustment_to_3000() {
        let components = combine(5_000, 5_000);
        assert_eq!(components.market_adjustment_bps, 3000);
        assert_eq!(components.volatility_premium_bps, 5000);
        assert_eq!(components.total_bps, 18_000);
    }

    #[test]
    fn circuit_breaker_clamps_total_to_5000_floor() {
        let components = combine(-10_000, 0);
        assert_eq!(components.market_adjustment_bps, -3000);
        assert_eq!(components.total_bps, 7000);
    }

    #[test]
    fn total_bps_always_within_invariant_range() {
        for raw_market in [-10_000, -3000, 0, 1350, 3000, 10_000] {
            for raw_vol in [-1000, 0, 2500, 5000, 10_000] {
                let components = combine(raw_market, raw_vol);
                assert!((5000..=20_000).contains(&components.total_bps));
            }
        }
    }

    #[test]
    fn missing_bridge_data_adds_200_bps() {
        let product = ProductKey::new(CoverageType::Depeg, Blockchain::Ethereum, Asset::Usdc);
        let mut market = market(1.0, 1.0, 0.0, 0, 0.0);
        market.bridge_health_scores.clear();
        assert_eq!(bridge_adjustment_bps(None), 200);
        let raw = raw_market_adjustment_bps(product, &market);
        assert_eq!(raw, -100 + 200 - 50 + 0 + 0);
    }

    #[test]
    fn swing_premium_adds_hedge_cost_on_top_of_risk_adjusted_base() {
        let multiplier = combine(1350, 5000);
        let swing = swing_premium(0.04, 100_000.0, 90.0, &multiplier, 159.0);
        let expected_base = 100_000.0 * 0.04 * 90.0 / 365.0;
        assert!((swing.base_premium - expected_base).abs() < 1e-6);
        assert!((swing.total_premium - (expected_base * 1.635 + 159.0)).abs() < 1e-6);
    }
}
