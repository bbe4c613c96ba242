//! End-to-end tests of the hybrid forecasting session.

use std::time::Duration as StdDuration;

use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seawave_forecast::hybrid::SessionState;
use seawave_forecast::models::HannanRissanenArimax;
use seawave_forecast::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Linear trend plus wind effect (coefficient 0.5) plus small noise.
fn generate_wave_data(n: usize, seed: u64) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let wind = rng.gen_range(2.0..8.0);
            let noise = rng.gen_range(-0.05..0.05);
            let height = 1.0 + 0.02 * i as f64 + 0.5 * wind + noise;
            Observation::new(base + Duration::hours(i as i64), height, wind).unwrap()
        })
        .collect()
}

fn paper_config() -> HybridConfig {
    HybridConfig::default()
        .with_arimax(ArimaxOrder::new(1, 1, 0))
        .with_recurrent(RecurrentConfig::new(12, 10, 0.01))
}

#[test]
fn hybrid_forecast_meets_mape_threshold() {
    init_tracing();
    let observations = generate_wave_data(100, 42);
    let mut session = HybridForecaster::new(paper_config()).unwrap();
    session.fit(&observations).unwrap();

    let split = session.split().unwrap();
    assert_eq!(split.training.len(), 70);
    assert_eq!(split.validation.len(), 15);
    assert_eq!(split.test.len(), 15);

    let report = session.evaluate().unwrap();
    let test_mape = report.test.hybrid_mape.unwrap();
    assert!(test_mape < 20.0, "test MAPE {test_mape} too high");
    assert!(report.test.arimax_mape.unwrap() < 20.0);
    assert!(report.validation.hybrid_mape.unwrap() < 20.0);
    assert_eq!(session.state(), SessionState::Forecasted);
}

#[test]
fn evaluation_records_follow_test_rows() {
    let observations = generate_wave_data(100, 7);
    let mut session = HybridForecaster::new(paper_config()).unwrap();
    session.fit(&observations).unwrap();
    let report = session.evaluate().unwrap();

    assert_eq!(report.records.len(), 15);
    assert_eq!(report.test.rows, 15);
    for (record, obs) in report.records.iter().zip(&observations[85..]) {
        assert_eq!(record.prediction_timestamp, obs.timestamp());
        assert_relative_eq!(record.wave_height_in, obs.wave_height(), epsilon = 5e-5);
        assert_relative_eq!(
            record.hybrid_forecast,
            record.arimax_forecast + record.lstm_residual_forecast,
            epsilon = 2e-4
        );
        assert!(record.mape.is_some());
    }

    let metrics = report.test_metrics.as_ref().unwrap();
    assert!(metrics.rmse >= 0.0);
    assert_relative_eq!(metrics.mape.unwrap(), report.test.hybrid_mape.unwrap(), epsilon = 1e-9);
}

#[test]
fn fit_report_describes_components() {
    let observations = generate_wave_data(100, 3);
    let mut session = HybridForecaster::new(paper_config()).unwrap();
    session.fit(&observations).unwrap();
    let report = session.fit_report().unwrap();

    assert_eq!(report.estimator, "ARIMAX-OLS");
    assert_eq!(report.order, ArimaxOrder::new(1, 1, 0));
    assert_eq!(report.phi.len(), 1);
    assert!(report.theta.is_empty());
    assert_relative_eq!(report.beta_x, 0.5, epsilon = 0.05);
    assert_eq!(report.std_errors.len(), 3);
    assert_eq!(report.training.losses.len(), 10);
    assert!(report.residual_scaler.stable);
    assert_eq!(report.stationarity.acf.len(), 11);
    assert_eq!(report.stationarity.pacf.len(), 10);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"estimator\":\"ARIMAX-OLS\""));
}

#[test]
fn moving_average_order_with_ols_is_ignored() {
    let observations = generate_wave_data(100, 11);
    let config = paper_config().with_arimax(ArimaxOrder::new(1, 1, 1));
    let mut session = HybridForecaster::new(config).unwrap();
    session.fit(&observations).unwrap();

    let fit = session.arimax_fit().unwrap();
    assert_eq!(fit.order().q, 1);
    assert!(fit.theta().is_empty());
}

#[test]
fn hannan_rissanen_session() {
    let observations = generate_wave_data(100, 5);
    let config = paper_config().with_arimax(ArimaxOrder::new(1, 1, 1));
    let residual_model = GruResidualModel::new(config.recurrent.clone());
    let mut session = HybridForecaster::with_models(
        config,
        HannanRissanenArimax::new(),
        residual_model,
        StandardScaler::new(),
    )
    .unwrap();
    session.fit(&observations).unwrap();

    assert_eq!(session.arimax_fit().unwrap().theta().len(), 1);
    let report = session.evaluate().unwrap();
    assert!(report.test.hybrid_mape.unwrap() < 20.0);
}

#[test]
fn toml_config_drives_session() {
    let config = HybridConfig::from_toml_str(
        r#"
        [arimax]
        p = 1
        d = 1

        [recurrent]
        window = 8
        epochs = 4
        seed = 9
        "#,
    )
    .unwrap();
    let mut session = HybridForecaster::new(config).unwrap();
    session.fit(&generate_wave_data(80, 1)).unwrap();
    assert_eq!(session.residual_model().window(), 8);

    let forecast = session.forecast(&[4.0, 4.5, 5.0]).unwrap();
    assert_eq!(forecast.horizon(), 3);
    for i in 0..3 {
        assert_relative_eq!(forecast.hybrid[i], forecast.arimax[i] + forecast.residual[i]);
    }
}

#[test]
fn same_seed_same_session() {
    let observations = generate_wave_data(90, 21);
    let mut a = HybridForecaster::new(paper_config()).unwrap();
    let mut b = HybridForecaster::new(paper_config()).unwrap();
    a.fit(&observations).unwrap();
    b.fit(&observations).unwrap();

    assert_eq!(a.fit_report().unwrap().training, b.fit_report().unwrap().training);
    assert_eq!(a.evaluate().unwrap(), b.evaluate().unwrap());
}

#[test]
fn expired_deadline_cancels_training() {
    let cancel = CancellationToken::with_timeout(StdDuration::ZERO);
    let mut session = HybridForecaster::new(paper_config())
        .unwrap()
        .with_cancellation(cancel);

    assert!(matches!(
        session.fit(&generate_wave_data(100, 2)),
        Err(ForecastError::Cancelled)
    ));
    assert_eq!(session.state(), SessionState::ResidualsComputed);
}

#[test]
fn too_little_data_for_window() {
    // 30 points leave 21 training rows and 19 residuals, too few for window 20
    let config = paper_config().with_recurrent(RecurrentConfig::new(20, 5, 0.01));
    let mut session = HybridForecaster::new(config).unwrap();
    assert!(matches!(
        session.fit(&generate_wave_data(30, 4)),
        Err(ForecastError::InsufficientData { .. })
    ));
}

#[test]
fn prediction_record_round_trips_through_json() {
    let mut session = HybridForecaster::new(paper_config()).unwrap();
    session.fit(&generate_wave_data(100, 8)).unwrap();

    let obs = Observation::new(Utc.with_ymd_and_hms(2024, 5, 5, 4, 0, 0).unwrap(), 3.2, 4.4).unwrap();
    let record = session.predict_observation(&obs).unwrap();
    assert_eq!(record.prediction_timestamp, obs.timestamp());

    let json = serde_json::to_string(&record).unwrap();
    let back: HybridPrediction = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}
