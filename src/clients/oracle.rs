//! Oracle price aggregation (§4.5): median of whichever sources respond,
//! with any source deviating more than 5% from that median dropped before
//! the final consensus price is struck.

use crate::domain::{Asset, ConsensusPrice};
use crate::error::ClientError;
use crate::scheduling::{with_backoff, RateLimiter};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// §7 "retry with exponential backoff (1s -> 16s, cap 5 attempts)".
const MAX_FETCH_ATTEMPTS: u32 = 5;

const DEVIATION_DROPOUT: f64 = 0.05;

/// One upstream price feed (Chainlink, Pyth, RedStone, ...). Implementors
/// are expected to apply their own timeout and rate limiting internally.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_price(&self, asset: Asset) -> Result<f64, ClientError>;
}

pub struct OracleAggregator {
    sources: Vec<Arc<dyn PriceSource>>,
}

impl OracleAggregator {
    pub fn new(sources: Vec<Arc<dyn PriceSource>>) -> Self {
        Self { sources }
    }

    /// Queries every configured source concurrently, takes the median of
    /// the ones that answered, then drops any answer more than 5% away
    /// from that median and recomputes the median over the survivors.
    /// Fails only if every source errors.
    pub async fn aggregate(&self, asset: Asset) -> Result<ConsensusPrice, ClientError> {
        let fetches = self.sources.iter().map(|s| {
            let s = Arc::clone(s);
            async move { (s.name().to_string(), s.fetch_price(asset).await) }
        });
        let results = join_all(fetches).await;

        let ok: Vec<(String, f64)> = results
            .into_iter()
            .filter_map(|(name, r)| r.ok().map(|price| (name, price)))
            .collect();

        if ok.is_empty() {
            return Err(ClientError::Unavailable(format!(
                "no oracle source answered for {asset}"
            )));
        }

        let first_median = median(&ok.iter().map(|(_, p)| *p).collect::<Vec<_>>());
        let survivors: Vec<(String, f64)> = ok
            .iter()
            .filter(|(_, p)| ((p - first_median) / first_median).abs() <= DEVIATION_DROPOUT)
            .cloned()
            .collect();

        let (sources, prices): (Vec<String>, Vec<f64>) = if survivors.is_empty() {
            ok.into_iter().unzip()
        } else {
            survivors.into_iter().unzip()
        };
        let median_price = median(&prices);
        let confidence = prices.len() as f64 / self.sources.len().max(1) as f64;

        Ok(ConsensusPrice {
            asset,
            median_price,
            sources: sources.into_iter().zip(prices).collect(),
            confidence,
        })
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("non-NaN price"));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// HTTP-backed source hitting a single upstream URL; shared across the
/// Chainlink/Pyth/RedStone deployments, distinguished by base URL and name.
pub struct HttpPriceSource {
    name: String,
    base_url: String,
    client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl HttpPriceSource {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, rate_limit_per_minute: u32, timeout_secs: u64) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("reqwest client config is valid"),
            rate_limiter: RateLimiter::per_minute(rate_limit_per_minute),
        }
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_price(&self, asset: Asset) -> Result<f64, ClientError> {
        with_backoff(MAX_FETCH_ATTEMPTS, || async {
            self.rate_limiter.acquire().await;
            let url = format!("{}/price/{}", self.base_url, asset);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|_| ClientError::Timeout)?;
            if !response.status().is_success() {
                return Err(ClientError::Upstream(response.status().as_u16()));
            }
            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ClientError::Parse(e.to_string()))?;
            body.get("price")
                .and_then(|v| v.as_f64())
                .ok_or_else(|| ClientError::Parse("missing price field".to_string()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        name: &'static str,
        price: Result<f64, ClientError>,
    }

    #[async_trait]
    impl PriceSource for FixedSource {
        fn name(&self) -> &str {
            self.name
        }
        async fn fetch_price(&self, _asset: Asset) -> Result<f64, ClientError> {
            self.price.clone()
        }
    }

    #[tokio::test]
    async fn aggregates_median_of_agreeing_sources() {
        let aggregator = OracleAggregator::new(vec![
            Arc::new(FixedSource { name: "a", price: Ok(0.998) }),
            Arc::new(FixedSource { name: "b", price: Ok(0.999) }),
            Arc::new(FixedSource { name: "c", price: Ok(1.000) }),
        ]);
        let consensus = aggregator.aggregate(Asset::Usdc).await.unwrap();
        assert!((consensus.median_price - 0.999).abs() < 1e-9);
        assert_eq!(consensus.confidence, 1.0);
    }

    #[tokio::test]
    async fn drops_source_deviating_more_than_5_percent() {
        let aggregator = OracleAggregator::new(vec![
            Arc::new(FixedSource { name: "a", price: Ok(1.00) }),
            Arc::new(FixedSource { name: "b", price: Ok(1.00) }),
            Arc::new(FixedSource { name: "c", price: Ok(1.20) }),
        ]);
        let consensus = aggregator.aggregate(Asset::Usdc).await.unwrap();
        assert_eq!(consensus.sources.len(), 2);
        assert!((consensus.median_price - 1.00).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fails_only_when_every_source_errors() {
        let aggregator = OracleAggregator::new(vec![
            Arc::new(FixedSource { name: "a", price: Err(ClientError::Timeout) }),
            Arc::new(FixedSource { name: "b", price: Err(ClientError::RateLimited) }),
        ]);
        assert!(aggregator.aggregate(Asset::Usdc).await.is_err());
    }
}
