//! Hedge Cost Fetcher (§4.4, component C4). Allocates a nominal 20% of
//! coverage across four venues and sums whichever venues have an applicable
//! market for the product's coverage type; a venue with no market degrades
//! to `None` and never fails the aggregate (§4.4 failure model).

use crate::config::HedgeSettings;
use crate::domain::{CoverageType, HedgeCostBreakdown, ProductKey};
use crate::error::ClientError;
use chrono::Utc;

/// External inputs the fetcher needs per product; implemented over the
/// real hedge-venue HTTP clients in production and a fixture in tests
/// (§9 "Polymorphism": clients sit behind a trait).
#[async_trait::async_trait]
pub trait HedgeMarketData: Send + Sync {
    /// Implied depeg/bridge-exploit probability from Polymarket, if a
    /// market exists for this product.
    async fn polymarket_odds(&self, product: ProductKey) -> Result<Option<f64>, ClientError>;
    /// Daily funding rate Hyperliquid charges to short the asset (or LINK
    /// for Oracle coverage), if a market exists.
    async fn hyperliquid_daily_funding(&self, product: ProductKey) -> Result<Option<f64>, ClientError>;
    /// Hourly funding rate on Binance perpetuals, if applicable.
    async fn binance_hourly_funding(&self, product: ProductKey) -> Result<Option<f64>, ClientError>;
}

fn allianz_rate(coverage_type: CoverageType) -> f64 {
    match coverage_type {
        CoverageType::Depeg => 0.0045,
        CoverageType::Bridge => 0.0065,
        CoverageType::SmartContract => 0.0085,
        CoverageType::Oracle => 0.0075,
        CoverageType::CexLiquidation => 0.0055,
    }
}

pub struct HedgeCostFetcher {
    settings: HedgeSettings,
}

impl HedgeCostFetcher {
    pub fn new(settings: HedgeSettings) -> Self {
        Self { settings }
    }

    /// Fetches all four venues concurrently (§5 "all hedge venues" run
    /// concurrently within one iteration) and aggregates into a
    /// `HedgeCostBreakdown`. Per-venue failures degrade to `None`.
    pub async fn fetch(
        &self,
        product: ProductKey,
        coverage_usd: f64,
        data: &dyn HedgeMarketData,
    ) -> HedgeCostBreakdown {
        let (poly, hyper, bin) = tokio::join!(
            data.polymarket_odds(product),
            data.hyperliquid_daily_funding(product),
            data.binance_hourly_funding(product),
        );

        let polymarket = self.polymarket_cost(product.coverage_type, coverage_usd, poly);
        let hyperliquid = self.hyperliquid_cost(product.coverage_type, coverage_usd, hyper);
        let binance = self.binance_cost(product.coverage_type, coverage_usd, bin);
        let allianz = Some(coverage_usd * self.settings.weight_allianz * self.settings.hedge_ratio * allianz_rate(product.coverage_type));

        let total_hedge_cost = [polymarket, hyperliquid, binance, allianz]
            .into_iter()
            .flatten()
            .sum::<f64>();
        let effective_premium_addition = if coverage_usd > 0.0 {
            total_hedge_cost / coverage_usd
        } else {
            0.0
        };

        HedgeCostBreakdown {
            polymarket,
            hyperliquid,
            binance,
            allianz,
            total_hedge_cost,
            hedge_ratio: self.settings.hedge_ratio,
            effective_premium_addition,
            timestamp: Utc::now(),
        }
    }

    fn polymarket_cost(
        &self,
        coverage_type: CoverageType,
        coverage_usd: f64,
        odds: Result<Option<f64>, ClientError>,
    ) -> Option<f64> {
        if !matches!(coverage_type, CoverageType::Depeg | CoverageType::Bridge) {
            return None;
        }
        let odds = odds.ok().flatten()?;
        Some(coverage_usd * self.settings.weight_polymarket * self.settings.hedge_ratio * odds)
    }

    fn hyperliquid_cost(
        &self,
        coverage_type: CoverageType,
        coverage_usd: f64,
        daily_funding: Result<Option<f64>, ClientError>,
    ) -> Option<f64> {
        if !matches!(coverage_type, CoverageType::SmartContract | CoverageType::Oracle) {
            return None;
        }
        let funding = daily_funding.ok().flatten()?;
        Some(coverage_usd * self.settings.weight_hyperliquid * self.settings.hedge_ratio * (funding.abs() * 30.0 + 0.002))
    }

    fn binance_cost(
        &self,
        coverage_type: CoverageType,
        coverage_usd: f64,
        hourly_funding: Result<Option<f64>, ClientError>,
    ) -> Option<f64> {
        if !matches!(coverage_type, CoverageType::CexLiquidation) {
            return None;
        }
        let funding = hourly_funding.ok().flatten()?;
        Some(coverage_usd * self.settings.weight_binance * self.settings.hedge_ratio * (funding.abs() * 24.0 * 30.0 + 0.001))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, Blockchain};

    struct FixtureMarketData {
        polymarket_odds: Option<f64>,
        hyperliquid_daily: Option<f64>,
        binance_hourly: Option<f64>,
    }

    #[async_trait::async_trait]
    impl HedgeMarketData for FixtureMarketData {
        async fn polymarket_odds(&self, _product: ProductKey) -> Result<Option<f64>, ClientError> {
            Ok(self.polymarket_odds)
        }
        async fn hyperliquid_daily_funding(&self, _product: ProductKey) -> Result<Option<f64>, ClientError> {
            Ok(self.hyperliquid_daily)
        }
        async fn binance_hourly_funding(&self, _product: ProductKey) -> Result<Option<f64>, ClientError> {
            Ok(self.binance_hourly)
        }
    }

    #[tokio::test]
    async fn scenario_4_hedge_cost_aggregation() {
        let fetcher = HedgeCostFetcher::new(HedgeSettings::default());
        let data = FixtureMarketData {
            polymarket_odds: Some(0.025),
            hyperliquid_daily: Some(0.0015),
            binance_hourly: Some(0.0001),
        };
        let product = ProductKey::new(CoverageType::Depeg, Blockchain::Ethereum, Asset::Usdc);

        let breakdown = fetcher.fetch(product, 100_000.0, &data).await;

        assert!((breakdown.polymarket.unwrap() - 150.0).abs() < 1e-6);
        assert!(breakdown.hyperliquid.is_none());
        assert!(breakdown.binance.is_none());
        assert!((breakdown.allianz.unwrap() - 9.0).abs() < 1e-6);
        assert!((breakdown.total_hedge_cost - 159.0).abs() < 1e-6);
        assert!((breakdown.effective_premium_addition - 0.00159).abs() < 1e-9);
        assert!(breakdown.conserves());
    }

    #[tokio::test]
    async fn venue_failure_degrades_to_none() {
        let fetcher = HedgeCostFetcher::new(HedgeSettings::default());
        let data = FixtureMarketData {
            polymarket_odds: None,
            hyperliquid_daily: None,
            binance_hourly: Some(0.0002),
        };
        let product = ProductKey::new(CoverageType::CexLiquidation, Blockchain::Ethereum, Asset::Usdt);
        let breakdown = fetcher.fetch(product, 50_000.0, &data).await;
        assert!(breakdown.polymarket.is_none());
        assert!(breakdown.hyperliquid.is_none());
        assert!(breakdown.binance.is_some());
        assert!(breakdown.conserves());
    }
}
