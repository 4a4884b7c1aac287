//! Exercises the external data clients' retry/backoff, per-call timeout and
//! rate-limit integration (§7) against a real HTTP server (`wiremock`)
//! instead of asserting on the retry/timeout plumbing in isolation.

use sure_risk_engine::clients::oracle::HttpPriceSource;
use sure_risk_engine::clients::{BridgeHealthClient, HttpBridgeHealthClient, PriceSource};
use sure_risk_engine::domain::Asset;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn price_source_retries_past_a_transient_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/price/.*$"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/price/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"price": 0.999})))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpPriceSource::new("chainlink", server.uri(), 600, 5);
    let price = source.fetch_price(Asset::Usdc).await.unwrap();
    assert!((price - 0.999).abs() < 1e-9);
}

#[tokio::test]
async fn price_source_gives_up_after_five_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/price/.*$"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&server)
        .await;

    let source = HttpPriceSource::new("pyth", server.uri(), 600, 5);
    let result = source.fetch_price(Asset::Usdt).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn bridge_client_honors_the_per_call_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/bridges/health$"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = HttpBridgeHealthClient::new(server.uri(), 600, 0);
    let result = client.fetch_health_scores().await;
    assert!(matches!(result, Err(sure_risk_engine::error::ClientError::Timeout)));
}

#[tokio::test]
async fn bridge_client_rate_limiter_still_lets_a_single_call_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/bridges/health$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"wormhole": 0.95})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpBridgeHealthClient::new(server.uri(), 60, 5);
    let scores = client.fetch_health_scores().await.unwrap();
    assert_eq!(scores.get("wormhole").copied(), Some(0.95));
}
