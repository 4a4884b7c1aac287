//! CEX liquidation rate (§3 `MarketConditions::cex_liquidation_rate`, §4.5).

use crate::error::ClientError;
use crate::scheduling::{with_backoff, RateLimiter};
use async_trait::async_trait;
use std::time::Duration;

const MAX_FETCH_ATTEMPTS: u32 = 5;

#[async_trait]
pub trait CexClient: Send + Sync {
    /// 24h liquidation volume as a fraction of open interest, used as the
    /// CEX-liquidation stress input.
    async fn fetch_liquidation_rate(&self) -> Result<f64, ClientError>;
}

pub struct HttpCexClient {
    base_url: String,
    client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl HttpCexClient {
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
impl CexClient for HttpCexClient {
    async fn fetch_liquidation_rate(&self) -> Result<f64, ClientError> {
        with_backoff(MAX_FETCH_ATTEMPTS, || async {
            self.rate_limiter.acquire().await;
            let url = format!("{}/futures/data/forceOrders", self.base_url);
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
            body.get("liquidation_rate")
                .and_then(|v| v.as_f64())
                .ok_or_else(|| ClientError::Parse("missing liquidation_rate field".to_string()))
        })
        .await
    }
}
