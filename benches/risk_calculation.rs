use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sure_risk_engine::config::PricingSettings;
use sure_risk_engine::domain::{Asset, CoverageType, Policy, PolicyStatus};
use sure_risk_engine::pricing::{PricingEngine, PricingRequest, VaultState};
use sure_risk_engine::risk::model;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

fn benchmark_premium_composition(c: &mut Criterion) {
    let engine = PricingEngine::new(PricingSettings::default());
    let request = PricingRequest {
        asset: Asset::Usdc,
        coverage_amount_cents: 1_000_000 * 100,
        duration_days: 90.0,
        trigger_price: 0.97,
    };
    let vault = VaultState { coverage_sold: 5_000_000.0, total_capital: 10_000_000.0 };
    let risk_factors = sure_risk_engine::domain::StablecoinRiskFactors::default();

    c.bench_function("calculate_premium", |b| {
        b.iter(|| engine.calculate_premium(black_box(&request), black_box(&vault), black_box(0.2), black_box(&risk_factors), black_box(None)))
    });
}

fn sample_policies(n: usize) -> Vec<Policy> {
    let now = Utc::now();
    (0..n)
        .map(|i| Policy {
            id: Uuid::new_v4(),
            coverage_type: CoverageType::Depeg,
            chain: sure_risk_engine::domain::Blockchain::Ethereum,
            asset: if i % 2 == 0 { Asset::Usdc } else { Asset::Usdt },
            coverage_amount_cents: 100_000_00 + i as u64 * 1000,
            trigger_price: 0.97,
            floor_price: 0.90,
            start_ts: now,
            expiry_ts: now + Duration::days(90),
            status: PolicyStatus::Active,
        })
        .collect()
}

fn benchmark_concentration(c: &mut Criterion) {
    let policies = sample_policies(1000);
    c.bench_function("concentration_by_asset_1000_policies", |b| {
        b.iter(|| model::concentration_by_asset(black_box(&policies)))
    });
}

fn benchmark_correlation_matrix(c: &mut Criterion) {
    let mut histories = HashMap::new();
    histories.insert(Asset::Usdc, (0..200).map(|i| 1.0 + (i as f64) * 0.0001).collect::<Vec<_>>());
    histories.insert(Asset::Usdt, (0..200).map(|i| 1.0 - (i as f64) * 0.0001).collect::<Vec<_>>());
    histories.insert(Asset::Dai, (0..200).map(|i| 1.0 + ((i as f64) * 0.37).sin() * 0.001).collect::<Vec<_>>());

    c.bench_function("correlation_matrix_3_assets", |b| {
        b.iter(|| model::correlation_matrix(black_box(&histories)))
    });
}

criterion_group!(benches, benchmark_premium_composition, benchmark_concentration, benchmark_correlation_matrix);
criterion_main!(benches);
