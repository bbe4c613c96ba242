//! Property-based tests for scaling, splitting and differencing.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated series.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use seawave_forecast::core::{split_observations, Observation, SplitConfig};
use seawave_forecast::models::arimax::{difference, DifferenceState, ForecastBuffer};
use seawave_forecast::transform::{create_sequences, Scaler, StandardScaler};

/// Build hourly observations from wave heights, with a derived wind speed.
fn make_observations(heights: &[f64]) -> Vec<Observation> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    heights
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            Observation::new(base + Duration::hours(i as i64), h, 3.0 + (i % 5) as f64).unwrap()
        })
        .collect()
}

/// Strategy for generating finite, non-constant series.
/// Adds small variation so the standard deviation never degenerates.
fn valid_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(-500.0..500.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.01;
            }
            v
        })
    })
}

/// Strategy for generating non-negative wave heights.
fn wave_heights_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| prop::collection::vec(0.0..8.0_f64, len))
}

// =============================================================================
// Property: Standardization round-trips and centers the series
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn scaler_round_trip(values in valid_values_strategy(2, 200)) {
        let scaler = StandardScaler::new();
        let (scaled, params) = scaler.fit_transform_standard(&values).unwrap();
        let restored = scaler.inverse_transform_standard(&scaled, &params);

        prop_assert_eq!(restored.len(), values.len());
        for (a, b) in values.iter().zip(&restored) {
            prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()), "{} != {}", a, b);
        }
    }

    #[test]
    fn scaled_series_has_zero_mean_unit_variance(values in valid_values_strategy(2, 200)) {
        let (scaled, params) = StandardScaler::new().fit_transform_standard(&values).unwrap();
        let n = scaled.len() as f64;
        let mean = scaled.iter().sum::<f64>() / n;
        let var = scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        prop_assert!(params.std > 0.0);
        prop_assert!(mean.abs() < 1e-9);
        prop_assert!((var - 1.0).abs() < 1e-9);
    }

    #[test]
    fn transform_matches_fit_transform(values in valid_values_strategy(2, 100)) {
        let scaler = StandardScaler::new();
        let (scaled, params) = scaler.fit_transform_standard(&values).unwrap();
        let again = scaler.transform_standard(&values, &params).unwrap();
        prop_assert_eq!(scaled, again);
    }
}

// =============================================================================
// Property: Chronological split is a disjoint, ordered cover
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn split_partitions_cover_series(heights in wave_heights_strategy(1, 300)) {
        let observations = make_observations(&heights);
        let split = split_observations(&observations, &SplitConfig::default()).unwrap();
        let n = observations.len();

        prop_assert_eq!(split.len(), n);
        prop_assert_eq!(split.training.len(), (n * 70) / 100);
        prop_assert_eq!(split.validation.len(), (n * 15) / 100);

        let rejoined: Vec<Observation> = split
            .training
            .iter()
            .map(|r| r.observation)
            .chain(split.holdout().copied())
            .collect();
        prop_assert_eq!(rejoined, observations);
    }

    #[test]
    fn split_sizes_follow_ratios(
        n in 1usize..500,
        train in 0.05..0.85_f64,
        validation in 0.0..0.1_f64,
    ) {
        let config = SplitConfig::new(train, validation);
        let (tr, va, te) = config.sizes(n);
        prop_assert_eq!(tr + va + te, n);
        prop_assert!((tr as f64 - train * n as f64).abs() < 1.0 + 1e-9);
        prop_assert!((va as f64 - validation * n as f64).abs() < 1.0 + 1e-9);
    }
}

// =============================================================================
// Property: Differencing state and lag buffers track the series
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn integration_restores_continuation(
        history in valid_values_strategy(5, 60),
        future in valid_values_strategy(1, 20),
        d in 0usize..=2,
    ) {
        let full: Vec<f64> = history.iter().chain(&future).copied().collect();
        let diffs = difference(&full, d);
        let mut state = DifferenceState::from_history(&history, d).unwrap();

        for (k, expected) in future.iter().enumerate() {
            let restored = state.integrate_next(diffs[history.len() - d + k]);
            prop_assert!((restored - expected).abs() <= 1e-6 * (1.0 + expected.abs()));
        }
    }

    #[test]
    fn buffer_keeps_latest_values(
        values in valid_values_strategy(1, 50),
        capacity in 1usize..8,
    ) {
        let mut buffer = ForecastBuffer::from_history(&[], capacity);
        for &v in &values {
            buffer.push(v);
        }
        prop_assert!(buffer.len() <= capacity);
        prop_assert_eq!(buffer.lag(1), *values.last().unwrap());
        let kept = values.len().min(capacity);
        prop_assert_eq!(buffer.to_vec(), values[values.len() - kept..].to_vec());
    }

    #[test]
    fn sequences_align_with_series(
        values in valid_values_strategy(2, 80),
        window in 1usize..10,
    ) {
        prop_assume!(values.len() > window);
        let seq = create_sequences(&values, window).unwrap();
        prop_assert_eq!(seq.len(), values.len() - window);
        for (i, input) in seq.inputs.iter().enumerate() {
            prop_assert_eq!(input.as_slice(), &values[i..i + window]);
            prop_assert_eq!(seq.targets[i], values[i + window]);
        }
    }
}
