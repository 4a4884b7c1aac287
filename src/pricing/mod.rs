//! Pricing Engine (§4.3, component C3). A pure sequence of rate transforms
//! applied left to right; no I/O, no suspension (§5 "Pure numeric functions
//! ... must not suspend").

use crate::config::PricingSettings;
use crate::domain::{Asset, StablecoinRiskFactors};
use serde::Serialize;

/// Inputs the caller controls for one quote. `coverage_amount_cents` mirrors
/// the persisted `Policy` representation (§9 "Numeric semantics"); all
/// intermediate math runs in `f64`.
#[derive(Debug, Clone, Copy)]
pub struct PricingRequest {
    pub asset: Asset,
    pub coverage_amount_cents: u64,
    pub duration_days: f64,
    pub trigger_price: f64,
}

impl PricingRequest {
    pub fn coverage_usd(&self) -> f64 {
        self.coverage_amount_cents as f64 / 100.0
    }
}

/// Vault-level state needed for the utilization step (§4.3 step 6).
#[derive(Debug, Clone, Copy)]
pub struct VaultState {
    pub coverage_sold: f64,
    pub total_capital: f64,
}

impl VaultState {
    pub fn utilization(&self) -> f64 {
        crate::tranche::calculate_utilization(self.coverage_sold, self.total_capital)
    }
}

/// Every intermediate factor of the composition (§4.3 "side contract"),
/// returned verbatim so a quote can be explained to a user or audited.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PremiumBreakdown {
    pub base_rate: f64,
    pub risk_adjusted_rate: f64,
    pub size_discount: f64,
    pub duration_adj: f64,
    pub trigger_adj: f64,
    pub utilization_adj: f64,
    pub market_stress_adj: f64,
    pub claims_adj: f64,
    pub composed_rate: f64,
    pub annual_premium_usd: f64,
    pub pro_rata_usd: f64,
    pub floor_usd: f64,
    pub final_premium_usd: f64,
    pub final_premium_cents: i64,
}

fn size_discount(coverage_usd: f64) -> f64 {
    if coverage_usd >= 10_000_000.0 {
        0.80
    } else if coverage_usd >= 1_000_000.0 {
        0.90
    } else if coverage_usd >= 100_000.0 {
        0.95
    } else {
        1.0
    }
}

fn duration_adj(days: f64) -> f64 {
    (days / 90.0).max(0.0).sqrt()
}

fn trigger_adj(trigger: f64) -> f64 {
    1.0 + (0.97 - trigger) / 0.07 * 0.5
}

fn utilization_adj(utilization: f64) -> f64 {
    if utilization > 0.90 {
        1.50
    } else if utilization > 0.75 {
        1.25
    } else if utilization > 0.50 {
        1.10
    } else {
        1.0
    }
}

fn market_stress_adj(stress: f64) -> f64 {
    1.0 + stress.clamp(0.0, 1.0) * 2.0
}

/// Claims experience adjustment relative to the 0.40 target loss ratio
/// (§4.3 step 8): above target the premium scales up 1:1 with the excess;
/// below target it eases off at half that slope. `None` means "no claims
/// history yet" and leaves the rate untouched.
fn claims_adj(loss_ratio: Option<f64>) -> f64 {
    const TARGET: f64 = 0.40;
    const SLOPE_ABOVE: f64 = 1.0;
    const SLOPE_BELOW: f64 = 0.5;
    match loss_ratio {
        None => 1.0,
        Some(lr) if lr >= TARGET => 1.0 + (lr - TARGET) * SLOPE_ABOVE,
        Some(lr) => 1.0 + (lr - TARGET) * SLOPE_BELOW,
    }
}

/// Rounds a non-negative dollar amount to cents using round-half-to-even
/// (§4.3, §9 "Numeric semantics"), without relying on a nightly-only
/// standard library method.
pub fn round_half_even_cents(dollars: f64) -> i64 {
    let cents = dollars * 100.0;
    let floor = cents.floor();
    let diff = cents - floor;
    let floor_i = floor as i64;
    if diff < 0.5 {
        floor_i
    } else if diff > 0.5 {
        floor_i + 1
    } else if floor_i % 2 == 0 {
        floor_i
    } else {
        floor_i + 1
    }
}

pub struct PricingEngine {
    settings: PricingSettings,
}

impl PricingEngine {
    pub fn new(settings: PricingSettings) -> Self {
        Self { settings }
    }

    /// Full composition with every intermediate factor retained (§4.3 side
    /// contract).
    pub fn quote_with_breakdown(
        &self,
        request: &PricingRequest,
        vault: &VaultState,
        market_stress: f64,
        risk_factors: &StablecoinRiskFactors,
        loss_ratio: Option<f64>,
    ) -> PremiumBreakdown {
        let rf = risk_factors.clamp_unit();
        let base_rate = self.settings.base_rate(request.asset);

        let weighted_factors = 0.30 * rf.reserve_quality
            + 0.25 * rf.banking_exposure
            + 0.20 * rf.redemption_velocity
            + 0.15 * rf.market_depth
            - 0.10 * rf.regulatory_clarity;
        let risk_adjusted_rate = base_rate * (1.0 + weighted_factors);

        let coverage_usd = request.coverage_usd();
        let size_discount = size_discount(coverage_usd);
        let duration_adj = duration_adj(request.duration_days);
        let trigger_adj = trigger_adj(request.trigger_price);
        let utilization_adj = utilization_adj(vault.utilization());
        let market_stress_adj = market_stress_adj(market_stress);
        let claims_adj = claims_adj(loss_ratio);

        let composed_rate = risk_adjusted_rate
            * size_discount
            * duration_adj
            * trigger_adj
            * utilization_adj
            * market_stress_adj
            * claims_adj;

        let annual_premium_usd = coverage_usd * composed_rate;
        let pro_rata_usd = annual_premium_usd * (request.duration_days / 365.0);
        let floor_usd = (coverage_usd * 0.01).max(100.0);
        let final_premium_usd = pro_rata_usd.max(floor_usd);
        let final_premium_cents = round_half_even_cents(final_premium_usd);

        PremiumBreakdown {
            base_rate,
            risk_adjusted_rate,
            size_discount,
            duration_adj,
            trigger_adj,
            utilization_adj,
            market_stress_adj,
            claims_adj,
            composed_rate,
            annual_premium_usd,
            pro_rata_usd,
            floor_usd,
            final_premium_usd,
            final_premium_cents,
        }
    }

    /// Public contract `calculate_premium(...) -> premium_cents` (§4.3).
    /// Delegates to `quote_with_breakdown` so the two public surfaces can
    /// never diverge (§8 idempotence property).
    pub fn calculate_premium(
        &self,
        request: &PricingRequest,
        vault: &VaultState,
        market_stress: f64,
        risk_factors: &StablecoinRiskFactors,
        loss_ratio: Option<f64>,
    ) -> i64 {
        self.quote_with_breakdown(request, vault, market_stress, risk_factors, loss_ratio)
            .final_premium_cents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Asset;

    fn engine() -> PricingEngine {
        PricingEngine::new(PricingSettings::default())
    }

    fn usdc_defaults() -> StablecoinRiskFactors {
        StablecoinRiskFactors::default()
    }

    #[test]
    fn scenario_1_usdc_depeg_calm_market() {
        let engine = engine();
        let req = PricingRequest {
            asset: Asset::Usdc,
            coverage_amount_cents: 100_000 * 100,
            duration_days: 90.0,
            trigger_price: 0.97,
        };
        let vault = VaultState {
            coverage_sold: 500_000.0,
            total_capital: 1_000_000.0,
        };
        let premium_cents = engine.calculate_premium(&req, &vault, 0.20, &usdc_defaults(), None);
        let premium_usd = premium_cents as f64 / 100.0;
        assert!(
            (800.0..=2000.0).contains(&premium_usd),
            "premium {} outside [$800,$2000]",
            premium_usd
        );
    }

    #[test]
    fn scenario_2_size_discount_lowers_effective_rate() {
        let engine = engine();
        let small = PricingRequest {
            asset: Asset::Usdc,
            coverage_amount_cents: 100_000 * 100,
            duration_days: 90.0,
            trigger_price: 0.97,
        };
        let big = PricingRequest {
            coverage_amount_cents: 10_000_000 * 100,
            ..small
        };
        let vault = VaultState {
            coverage_sold: 500_000.0,
            total_capital: 1_000_000.0,
        };
        let small_premium = engine.calculate_premium(&small, &vault, 0.20, &usdc_defaults(), None) as f64;
        let big_premium = engine.calculate_premium(&big, &vault, 0.20, &usdc_defaults(), None) as f64;

        let small_rate = small_premium / small.coverage_usd() / 100.0;
        let big_rate = big_premium / big.coverage_usd() / 100.0;
        assert!(big_rate < small_rate);
    }

    #[test]
    fn premium_floor_applies_for_small_coverage() {
        let engine = engine();
        let req = PricingRequest {
            asset: Asset::Usdc,
            coverage_amount_cents: 100 * 100,
            duration_days: 90.0,
            trigger_price: 0.97,
        };
        let vault = VaultState {
            coverage_sold: 0.0,
            total_capital: 1_000_000.0,
        };
        let premium_cents = engine.calculate_premium(&req, &vault, 0.0, &usdc_defaults(), None);
        assert!(premium_cents as f64 / 100.0 >= 100.0);
    }

    #[test]
    fn quote_with_breakdown_matches_calculate_premium() {
        let engine = engine();
        let req = PricingRequest {
            asset: Asset::Dai,
            coverage_amount_cents: 2_500_000 * 100,
            duration_days: 180.0,
            trigger_price: 0.95,
        };
        let vault = VaultState {
            coverage_sold: 800_000.0,
            total_capital: 1_000_000.0,
        };
        let breakdown = engine.quote_with_breakdown(&req, &vault, 0.35, &usdc_defaults(), Some(0.55));
        let direct = engine.calculate_premium(&req, &vault, 0.35, &usdc_defaults(), Some(0.55));
        assert_eq!(breakdown.final_premium_cents, direct);
    }
}
