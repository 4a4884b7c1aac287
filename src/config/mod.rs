//! Process-wide configuration (§6), loaded once at startup. One struct per
//! concern, each with a `Default` supplying the §6 defaults, overridable
//! from the environment — mirrors the teacher's `Settings` shape
//! (`backend/src/config/settings.rs`) generalized to this engine's
//! subsystems.

use crate::domain::{Asset, StablecoinRiskFactors};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub keeper: KeeperSettings,
    pub monitor: MonitorSettings,
    pub pricing: PricingSettings,
    pub hedge: HedgeSettings,
    pub risk_thresholds: RiskThresholds,
    pub upstreams: UpstreamSettings,
    pub onchain: OnChainSettings,
    pub alerts: AlertSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperSettings {
    pub tick_interval_secs: u64,
    pub full_update_after_secs: i64,
    pub hot_update_after_secs: i64,
    pub batch_size: usize,
    pub confirmation_poll_attempts: u32,
    pub onchain_send_timeout_secs: u64,
    pub onchain_confirm_timeout_secs: u64,
    pub full_refresh_hard_cap_secs: u64,
}

impl Default for KeeperSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            full_update_after_secs: 60,
            hot_update_after_secs: 10,
            batch_size: 10,
            confirmation_poll_attempts: 30,
            onchain_send_timeout_secs: 30,
            onchain_confirm_timeout_secs: 30,
            full_refresh_hard_cap_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    pub check_interval_secs: u64,
    pub iteration_hard_cap_secs: u64,
    pub shutdown_flush_budget_secs: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            check_interval_secs: 60,
            iteration_hard_cap_secs: 30,
            shutdown_flush_budget_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Base APR per asset (§6); assets absent from the map fall back to
    /// `default_base_apr`.
    pub base_apr: HashMap<String, f64>,
    pub default_base_apr: f64,
    pub quote_validity_window_secs: i64,
    /// Per-asset risk factors (§3 `StablecoinRiskFactors`, "static per
    /// asset; reloaded from config"); assets absent from the map fall back
    /// to `default_risk_factors`.
    pub risk_factors: HashMap<String, StablecoinRiskFactors>,
    pub default_risk_factors: StablecoinRiskFactors,
}

impl PricingSettings {
    pub fn base_rate(&self, asset: Asset) -> f64 {
        self.base_apr
            .get(&asset.to_string())
            .copied()
            .unwrap_or(self.default_base_apr)
    }

    pub fn risk_factors_for(&self, asset: Asset) -> StablecoinRiskFactors {
        self.risk_factors
            .get(&asset.to_string())
            .copied()
            .unwrap_or(self.default_risk_factors)
    }
}

impl Default for PricingSettings {
    fn default() -> Self {
        let mut base_apr = HashMap::new();
        base_apr.insert("USDC".to_string(), 0.04);
        base_apr.insert("USDT".to_string(), 0.06);
        base_apr.insert("DAI".to_string(), 0.05);
        base_apr.insert("FRAX".to_string(), 0.08);
        base_apr.insert("BUSD".to_string(), 0.045);

        let mut risk_factors = HashMap::new();
        risk_factors.insert("USDC".to_string(), StablecoinRiskFactors::default());
        risk_factors.insert(
            "FRAX".to_string(),
            StablecoinRiskFactors {
                reserve_quality: 0.70,
                banking_exposure: 0.35,
                redemption_velocity: 0.30,
                market_depth: 0.55,
                regulatory_clarity: 0.55,
                historical_volatility: 0.25,
            },
        );
        risk_factors.insert(
            "GHO".to_string(),
            StablecoinRiskFactors {
                reserve_quality: 0.75,
                banking_exposure: 0.20,
                redemption_velocity: 0.25,
                market_depth: 0.50,
                regulatory_clarity: 0.60,
                historical_volatility: 0.20,
            },
        );

        Self {
            base_apr,
            default_base_apr: 0.10,
            quote_validity_window_secs: 600,
            risk_factors,
            default_risk_factors: StablecoinRiskFactors {
                reserve_quality: 0.60,
                banking_exposure: 0.40,
                redemption_velocity: 0.40,
                market_depth: 0.45,
                regulatory_clarity: 0.45,
                historical_volatility: 0.30,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HedgeSettings {
    pub hedge_ratio: f64,
    pub weight_polymarket: f64,
    pub weight_hyperliquid: f64,
    pub weight_binance: f64,
    pub weight_allianz: f64,
    pub per_call_timeout_secs: u64,
}

impl Default for HedgeSettings {
    fn default() -> Self {
        Self {
            hedge_ratio: 0.20,
            weight_polymarket: 0.30,
            weight_hyperliquid: 0.30,
            weight_binance: 0.30,
            weight_allianz: 0.10,
            per_call_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub ltv_warn: f64,
    pub ltv_crit: f64,
    pub reserve_warn: f64,
    pub reserve_crit: f64,
    pub concentration_warn: f64,
    pub concentration_crit: f64,
    pub correlation_warn: f64,
    pub correlation_crit: f64,
    pub oracle_staleness_secs: i64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            ltv_warn: 0.70,
            ltv_crit: 0.75,
            reserve_warn: 0.20,
            reserve_crit: 0.15,
            concentration_warn: 0.25,
            concentration_crit: 0.30,
            correlation_warn: 0.70,
            correlation_crit: 0.85,
            oracle_staleness_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    pub chainlink_url: String,
    pub pyth_url: String,
    pub binance_url: String,
    pub redstone_url: String,
    pub polymarket_url: String,
    pub hyperliquid_url: String,
    pub etherscan_url: String,
    pub defillama_url: String,
    pub api_keys: HashMap<String, String>,
    pub http_timeout_secs: u64,
    pub rate_limit_per_minute: u32,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            chainlink_url: "https://api.chain.link".to_string(),
            pyth_url: "https://hermes.pyth.network".to_string(),
            binance_url: "https://api.binance.com".to_string(),
            redstone_url: "https://api.redstone.finance".to_string(),
            polymarket_url: "https://clob.polymarket.com".to_string(),
            hyperliquid_url: "https://api.hyperliquid.xyz".to_string(),
            etherscan_url: "https://api.etherscan.io".to_string(),
            defillama_url: "https://api.llama.fi".to_string(),
            api_keys: HashMap::new(),
            http_timeout_secs: 10,
            rate_limit_per_minute: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnChainSettings {
    pub network: String,
    pub oracle_contract_address: String,
    pub keeper_wallet_address: String,
}

impl Default for OnChainSettings {
    fn default() -> Self {
        Self {
            network: "ethereum".to_string(),
            oracle_contract_address: "0x0000000000000000000000000000000000000000".to_string(),
            keeper_wallet_address: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    pub pagerduty_routing_key: Option<String>,
    pub pagerduty_url: String,
    pub timeout_secs: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            pagerduty_routing_key: None,
            pagerduty_url: "https://events.pagerduty.com/v2/enqueue".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keeper: KeeperSettings::default(),
            monitor: MonitorSettings::default(),
            pricing: PricingSettings::default(),
            hedge: HedgeSettings::default(),
            risk_thresholds: RiskThresholds::default(),
            upstreams: UpstreamSettings::default(),
            onchain: OnChainSettings::default(),
            alerts: AlertSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Loads defaults, then overlays environment variables via the `config`
    /// crate (teacher convention, `backend/src/config/settings.rs`). Every
    /// field is reachable through `SURE__<SECTION>__<FIELD>` (e.g.
    /// `SURE__RISK_THRESHOLDS__LTV_WARN=0.8`); nested maps such as
    /// `pricing.base_apr` are reachable as `SURE__PRICING__BASE_APR__USDC`.
    /// `ConfigError` here is fatal at startup (§7).
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::Environment::with_prefix("SURE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_rate_falls_back_to_default() {
        let p = PricingSettings::default();
        assert_eq!(p.base_rate(Asset::Usdc), 0.04);
        assert_eq!(p.base_rate(Asset::Gho), p.default_base_apr);
    }
}
