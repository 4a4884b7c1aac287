//! Bridge health (§3 `MarketConditions::bridge_health_scores`, §4.5).

use crate::error::ClientError;
use crate::scheduling::{with_backoff, RateLimiter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

const MAX_FETCH_ATTEMPTS: u32 = 5;

#[async_trait]
pub trait BridgeHealthClient: Send + Sync {
    /// Health score in `[0.0, 1.0]` per named bridge, 1.0 being fully
    /// healthy (no known incidents, normal liquidity depth).
    async fn fetch_health_scores(&self) -> Result<HashMap<String, f64>, ClientError>;
}

pub struct HttpBridgeHealthClient {
    base_url: String,
    client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl HttpBridgeHealthClient {
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
impl BridgeHealthClient for HttpBridgeHealthClient {
    async fn fetch_health_scores(&self) -> Result<HashMap<String, f64>, ClientError> {
        with_backoff(MAX_FETCH_ATTEMPTS, || async {
            self.rate_limiter.acquire().await;
            let url = format!("{}/bridges/health", self.base_url);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|_| ClientError::Timeout)?;
            if !response.status().is_success() {
                return Err(ClientError::Upstream(response.status().as_u16()));
            }
            response
                .json::<HashMap<String, f64>>()
                .await
                .map_err(|e| ClientError::Parse(e.to_string()))
        })
        .await
    }
}
