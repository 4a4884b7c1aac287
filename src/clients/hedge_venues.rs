//! Real hedge-venue HTTP clients (§4.4): Polymarket, Hyperliquid and Binance,
//! following the same rate-limit/timeout/backoff discipline as the market
//! data clients in this module. A 404 means no market exists for the
//! product and degrades to `None`; any other failure is retried.

use crate::config::{HedgeSettings, UpstreamSettings};
use crate::domain::ProductKey;
use crate::error::ClientError;
use crate::hedge::HedgeMarketData;
use crate::scheduling::{with_backoff, RateLimiter};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

const MAX_FETCH_ATTEMPTS: u32 = 5;

/// Fetches Polymarket odds, Hyperliquid daily funding and Binance hourly
/// funding over HTTP, one rate limiter per venue (each has its own upstream
/// quota).
pub struct HttpHedgeMarketData {
    polymarket_url: String,
    hyperliquid_url: String,
    binance_url: String,
    client: reqwest::Client,
    polymarket_limiter: RateLimiter,
    hyperliquid_limiter: RateLimiter,
    binance_limiter: RateLimiter,
}

impl HttpHedgeMarketData {
    pub fn new(upstreams: &UpstreamSettings, hedge: &HedgeSettings) -> Self {
        Self {
            polymarket_url: upstreams.polymarket_url.clone(),
            hyperliquid_url: upstreams.hyperliquid_url.clone(),
            binance_url: upstreams.binance_url.clone(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(hedge.per_call_timeout_secs))
                .build()
                .expect("reqwest client config is valid"),
            polymarket_limiter: RateLimiter::per_minute(upstreams.rate_limit_per_minute),
            hyperliquid_limiter: RateLimiter::per_minute(upstreams.rate_limit_per_minute),
            binance_limiter: RateLimiter::per_minute(upstreams.rate_limit_per_minute),
        }
    }

    async fn fetch_field(&self, limiter: &RateLimiter, url: String, field: &str) -> Result<Option<f64>, ClientError> {
        with_backoff(MAX_FETCH_ATTEMPTS, || async {
            limiter.acquire().await;
            let response = self.client.get(&url).send().await.map_err(|_| ClientError::Timeout)?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !response.status().is_success() {
                return Err(ClientError::Upstream(response.status().as_u16()));
            }
            let body: serde_json::Value = response.json().await.map_err(|e| ClientError::Parse(e.to_string()))?;
            Ok(body.get(field).and_then(|v| v.as_f64()))
        })
        .await
    }
}

#[async_trait]
impl HedgeMarketData for HttpHedgeMarketData {
    async fn polymarket_odds(&self, product: ProductKey) -> Result<Option<f64>, ClientError> {
        let url = format!("{}/markets/{}", self.polymarket_url, product.name());
        self.fetch_field(&self.polymarket_limiter, url, "odds").await
    }

    async fn hyperliquid_daily_funding(&self, product: ProductKey) -> Result<Option<f64>, ClientError> {
        let url = format!("{}/funding/{}", self.hyperliquid_url, product.name());
        self.fetch_field(&self.hyperliquid_limiter, url, "daily_funding_rate").await
    }

    async fn binance_hourly_funding(&self, product: ProductKey) -> Result<Option<f64>, ClientError> {
        let url = format!("{}/fapi/v1/fundingRate/{}", self.binance_url, product.name());
        self.fetch_field(&self.binance_limiter, url, "funding_rate").await
    }
}
