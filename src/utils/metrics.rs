//! Accuracy metrics for forecast evaluation.

use crate::error::{ForecastError, Result};

/// Actuals whose magnitude is at or below this are skipped by MAPE.
pub const MAPE_ZERO_TOLERANCE: f64 = 1e-4;

/// Accuracy metrics for evaluating forecast performance.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (None if every actual is zero)
    pub mape: Option<f64>,
    /// Symmetric Mean Absolute Percentage Error
    pub smape: f64,
    /// R-squared (coefficient of determination)
    pub r_squared: f64,
}

/// Calculate accuracy metrics between actual and predicted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    check_pair(actual, predicted)?;

    let n = actual.len() as f64;

    let mae: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;

    let mse: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;

    let rmse = mse.sqrt();

    let smape: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum::<f64>()
        * 100.0
        / n;

    let mean_actual = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let ss_res = mse * n;
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse,
        mape: mape(actual, predicted)?,
        smape,
        r_squared,
    })
}

/// Mean absolute percentage error, in percent.
///
/// Pairs whose actual is within [`MAPE_ZERO_TOLERANCE`] of zero are left
/// out; `None` when nothing remains.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<Option<f64>> {
    check_pair(actual, predicted)?;

    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter_map(|(&a, &p)| absolute_percentage_error(a, p))
        .collect();

    if errors.is_empty() {
        return Ok(None);
    }
    Ok(Some(errors.iter().sum::<f64>() / errors.len() as f64))
}

/// `|actual - predicted| / |actual| * 100` for a single point.
pub fn absolute_percentage_error(actual: f64, predicted: f64) -> Option<f64> {
    if actual.abs() <= MAPE_ZERO_TOLERANCE {
        return None;
    }
    Some(((actual - predicted) / actual).abs() * 100.0)
}

fn check_pair(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    Ok(())
}
