//! Prometheus metrics registry (§6, §9 "Global state": "the metrics
//! registry ... [is a] process-wide singleton. Model them as
//! dependency-injected handles, not implicit globals; lifecycle: created
//! in `main`, handed to each loop.").

use prometheus::{CounterVec, GaugeVec, Opts, Registry};

pub struct EngineMetrics {
    pub registry: Registry,
    pub oracle_price_usd: GaugeVec,
    pub oracle_confidence: GaugeVec,
    pub oracle_staleness_seconds: GaugeVec,
    pub oracle_divergence_percent: GaugeVec,
    pub oracle_failures_total: CounterVec,
    pub oracle_circuit_breaker_total: CounterVec,
    pub keeper_update_success_total: CounterVec,
    pub keeper_update_failure_total: CounterVec,
    pub keeper_avg_duration_seconds: GaugeVec,
}

impl EngineMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let oracle_price_usd = GaugeVec::new(Opts::new("oracle_price_usd", "consensus stablecoin price in USD"), &["asset_provider"]).unwrap();
        let oracle_confidence = GaugeVec::new(Opts::new("oracle_confidence", "fraction of sources agreeing with consensus"), &["asset"]).unwrap();
        let oracle_staleness_seconds = GaugeVec::new(Opts::new("oracle_staleness_seconds", "age of last consensus price"), &["asset"]).unwrap();
        let oracle_divergence_percent = GaugeVec::new(Opts::new("oracle_divergence_percent", "max source deviation from consensus"), &["asset"]).unwrap();
        let oracle_failures_total = CounterVec::new(Opts::new("oracle_failures_total", "oracle source fetch failures"), &["provider"]).unwrap();
        let oracle_circuit_breaker_total = CounterVec::new(Opts::new("oracle_circuit_breaker_total", "multiplier clamp activations"), &["product"]).unwrap();
        let keeper_update_success_total = CounterVec::new(Opts::new("keeper_update_success_total", "successful per-product keeper updates"), &["strategy"]).unwrap();
        let keeper_update_failure_total = CounterVec::new(Opts::new("keeper_update_failure_total", "failed per-product keeper updates"), &["strategy"]).unwrap();
        let keeper_avg_duration_seconds = GaugeVec::new(Opts::new("keeper_avg_duration_seconds", "rolling average keeper iteration duration"), &["strategy"]).unwrap();

        for collector in [
            Box::new(oracle_price_usd.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(oracle_confidence.clone()),
            Box::new(oracle_staleness_seconds.clone()),
            Box::new(oracle_divergence_percent.clone()),
            Box::new(oracle_failures_total.clone()),
            Box::new(oracle_circuit_breaker_total.clone()),
            Box::new(keeper_update_success_total.clone()),
            Box::new(keeper_update_failure_total.clone()),
            Box::new(keeper_avg_duration_seconds.clone()),
        ] {
            registry.register(collector).expect("metric names are unique and registered once");
        }

        Self {
            registry,
            oracle_price_usd,
            oracle_confidence,
            oracle_staleness_seconds,
            oracle_divergence_percent,
            oracle_failures_total,
            oracle_circuit_breaker_total,
            keeper_update_success_total,
            keeper_update_failure_total,
            keeper_avg_duration_seconds,
        }
    }

    /// Renders the registry in the Prometheus text exposition format
    /// (§6 "exported as text").
    pub fn render(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf).expect("text encoding cannot fail for well-formed metrics");
        String::from_utf8(buf).expect("prometheus text encoder emits valid UTF-8")
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = EngineMetrics::new();
        metrics.oracle_price_usd.with_label_values(&["chainlink:USDC"]).set(0.999);
        let rendered = metrics.render();
        assert!(rendered.contains("oracle_price_usd"));
    }
}
