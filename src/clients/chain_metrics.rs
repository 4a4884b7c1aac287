//! Per-chain gas prices (§3 `MarketConditions::chain_gas_prices`, §4.5, §4.8
//! "chain gas for Ethereum" keeper adjustment).

use crate::domain::Blockchain;
use crate::error::ClientError;
use crate::scheduling::{with_backoff, RateLimiter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

const MAX_FETCH_ATTEMPTS: u32 = 5;

#[async_trait]
pub trait ChainMetricsClient: Send + Sync {
    /// Gas price in gwei-equivalent units per chain.
    async fn fetch_gas_prices(&self) -> Result<HashMap<Blockchain, f64>, ClientError>;
}

pub struct HttpChainMetricsClient {
    base_url: String,
    client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl HttpChainMetricsClient {
    pub fn new(base_url: impl Into<String>, rate_limit_per_minute: u32, timeout_secs: u64) -> Self {
        Self {
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
impl ChainMetricsClient for HttpChainMetricsClient {
    async fn fetch_gas_prices(&self) -> Result<HashMap<Blockchain, f64>, ClientError> {
        with_backoff(MAX_FETCH_ATTEMPTS, || async {
            self.rate_limiter.acquire().await;
            let url = format!("{}/gas", self.base_url);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|_| ClientError::Timeout)?;
            if !response.status().is_success() {
                return Err(ClientError::Upstream(response.status().as_u16()));
            }
            let raw: HashMap<String, f64> = response
                .json()
                .await
                .map_err(|e| ClientError::Parse(e.to_string()))?;

            let mut out = HashMap::new();
            for chain in Blockchain::ALL {
                if let Some(gwei) = raw.get(&chain.to_string()) {
                    out.insert(chain, *gwei);
                }
            }
            Ok(out)
        })
        .await
    }
}
