//! Last-known `MarketConditions` cache (§3 "Ownership", §5 "single-writer/
//! multi-reader cache published atomically per iteration"). The keeper is
//! the sole writer; the monitor, pricing engine and HTTP handlers read it.
//! Modeled as a dependency-injected handle per §9 "Global state", not an
//! implicit global.

use crate::domain::MarketConditions;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MarketConditionsCache {
    inner: Arc<RwLock<Option<MarketConditions>>>,
}

impl MarketConditionsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replaces the cached snapshot (§5 "published atomically
    /// per iteration").
    pub async fn publish(&self, conditions: MarketConditions) {
        *self.inner.write().await = Some(conditions);
    }

    pub async fn get(&self) -> Option<MarketConditions> {
        self.inner.read().await.clone()
    }

    /// `true` if no snapshot has been published yet, or the cached one is
    /// older than `validity_window_secs` (§7 "quote endpoint ... marks the
    /// quote stale=true").
    pub async fn is_stale(&self, validity_window_secs: i64) -> bool {
        match self.inner.read().await.as_ref() {
            None => true,
            Some(mc) => mc.is_stale(chrono::Utc::now(), validity_window_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample() -> MarketConditions {
        MarketConditions {
            stablecoin_prices: HashMap::new(),
            bridge_health_scores: HashMap::new(),
            cex_liquidation_rate: 0.0,
            chain_gas_prices: HashMap::new(),
            protocol_exploit_count_24h: 0,
            overall_volatility_index: 0.0,
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_cache_is_stale() {
        let cache = MarketConditionsCache::new();
        assert!(cache.is_stale(600).await);
    }

    #[tokio::test]
    async fn published_snapshot_is_fresh() {
        let cache = MarketConditionsCache::new();
        cache.publish(sample()).await;
        assert!(!cache.is_stale(600).await);
        assert!(cache.get().await.is_some());
    }
}
