//! Benchmarks for ARIMAX estimation, GRU training and the full session.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seawave_forecast::models::arimax::{ArimaxOrder, HannanRissanenArimax, OlsArimax};
use seawave_forecast::models::{ArimaxEstimator, GruResidualModel, RecurrentConfig, ResidualModel};
use seawave_forecast::prelude::{HybridConfig, HybridForecaster, Observation};
use seawave_forecast::utils::CancellationToken;

fn generate_series(n: usize) -> (Vec<f64>, Vec<f64>) {
    let x: Vec<f64> = (0..n).map(|i| 5.0 + 2.0 * (i as f64 * 0.37).sin()).collect();
    let y = x
        .iter()
        .enumerate()
        .map(|(i, w)| 1.0 + 0.01 * i as f64 + 0.5 * w + 0.1 * (i as f64 * 1.7).cos())
        .collect();
    (y, x)
}

fn generate_observations(n: usize) -> Vec<Observation> {
    let (y, x) = generate_series(n);
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    y.iter()
        .zip(&x)
        .enumerate()
        .map(|(i, (&h, &w))| Observation::new(base + Duration::hours(i as i64), h, w).unwrap())
        .collect()
}

fn bench_arimax(c: &mut Criterion) {
    let mut group = c.benchmark_group("arimax_train");

    for size in [100, 500, 2000].iter() {
        let (y, x) = generate_series(*size);

        group.bench_with_input(BenchmarkId::new("OLS", size), size, |b, _| {
            b.iter(|| OlsArimax.train(black_box(&y), black_box(&x), ArimaxOrder::new(2, 1, 0)))
        });

        group.bench_with_input(BenchmarkId::new("HannanRissanen", size), size, |b, _| {
            let estimator = HannanRissanenArimax::new();
            b.iter(|| estimator.train(black_box(&y), black_box(&x), ArimaxOrder::new(1, 1, 1)))
        });
    }

    group.finish();
}

fn bench_gru(c: &mut Criterion) {
    let mut group = c.benchmark_group("gru_train");
    group.sample_size(10);

    for hidden in [4, 8, 16].iter() {
        let residuals: Vec<f64> = (0..200).map(|i| (i as f64 * 0.3).sin()).collect();

        group.bench_with_input(BenchmarkId::new("hidden", hidden), hidden, |b, &h| {
            b.iter(|| {
                let mut model = GruResidualModel::new(RecurrentConfig::default().with_hidden_size(h));
                model.train(black_box(&residuals), &CancellationToken::new())
            })
        });
    }

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let observations = generate_observations(300);
    let mut group = c.benchmark_group("hybrid_session");
    group.sample_size(10);

    group.bench_function("fit", |b| {
        b.iter(|| {
            let mut session = HybridForecaster::new(HybridConfig::default()).unwrap();
            session.fit(black_box(&observations))
        })
    });

    let mut session = HybridForecaster::new(HybridConfig::default()).unwrap();
    session.fit(&observations).unwrap();
    let winds = vec![5.0; 24];
    group.bench_function("forecast_24", |b| b.iter(|| session.forecast(black_box(&winds))));

    group.finish();
}

criterion_group!(benches, bench_arimax, bench_gru, bench_session);
criterion_main!(benches);
