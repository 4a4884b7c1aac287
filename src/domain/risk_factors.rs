use serde::{Deserialize, Serialize};

/// Static per-asset risk inputs (§3), reloaded from config. Each field lives
/// in `[0,1]`; higher is "safer" for `reserve_quality`, `market_depth` and
/// `regulatory_clarity`, and "riskier" for the remaining three — the sign
/// convention the pricing weights in §4.3 step 2 assume.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StablecoinRiskFactors {
    pub reserve_quality: f64,
    pub banking_exposure: f64,
    pub redemption_velocity: f64,
    pub market_depth: f64,
    pub regulatory_clarity: f64,
    pub historical_volatility: f64,
}

impl StablecoinRiskFactors {
    pub fn clamp_unit(self) -> Self {
        let c = |v: f64| v.clamp(0.0, 1.0);
        Self {
            reserve_quality: c(self.reserve_quality),
            banking_exposure: c(self.banking_exposure),
            redemption_velocity: c(self.redemption_velocity),
            market_depth: c(self.market_depth),
            regulatory_clarity: c(self.regulatory_clarity),
            historical_volatility: c(self.historical_volatility),
        }
    }
}

impl Default for StablecoinRiskFactors {
    /// Conservative USDC-like defaults used where config omits an entry.
    fn default() -> Self {
        Self {
            reserve_quality: 0.95,
            banking_exposure: 0.15,
            redemption_velocity: 0.10,
            market_depth: 0.90,
            regulatory_clarity: 0.85,
            historical_volatility: 0.05,
        }
    }
}
