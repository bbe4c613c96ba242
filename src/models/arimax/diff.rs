//! Differencing and integration for ARIMAX models.

use crate::error::{ForecastError, Result};

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series, `d` values shorter than the input.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    if d == 0 || series.is_empty() {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Last value at every differencing depth below `d`.
///
/// `levels[k]` is the final element of the series differenced `k` times.
/// Integrating a new `d`-th difference walks the levels from the deepest up;
/// differencing a new raw value walks them from the top down. Either way the
/// state advances by one step, so recursive forecasts and exogenous
/// continuations stay aligned with the training history.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceState {
    levels: Vec<f64>,
}

impl DifferenceState {
    /// Capture the state at the end of `history`.
    pub fn from_history(history: &[f64], d: usize) -> Result<Self> {
        if history.len() < d.max(1) {
            return Err(ForecastError::InsufficientData {
                needed: d.max(1),
                got: history.len(),
            });
        }

        let mut levels = Vec::with_capacity(d);
        let mut current = history.to_vec();
        for _ in 0..d {
            // length checked above, every level keeps at least one element
            levels.push(current[current.len() - 1]);
            current = difference(&current, 1);
        }
        Ok(Self { levels })
    }

    pub fn order(&self) -> usize {
        self.levels.len()
    }

    /// Last original-scale value, if any differencing is tracked.
    pub fn last_level(&self) -> Option<f64> {
        self.levels.first().copied()
    }

    /// Turn the next `d`-th difference into an original-scale value.
    pub fn integrate_next(&mut self, diff: f64) -> f64 {
        let mut value = diff;
        for level in self.levels.iter_mut().rev() {
            *level += value;
            value = *level;
        }
        value
    }

    /// Turn the next original-scale value into its `d`-th difference.
    pub fn difference_next(&mut self, value: f64) -> f64 {
        let mut current = value;
        for level in self.levels.iter_mut() {
            let previous = *level;
            *level = current;
            current -= previous;
        }
        current
    }
}

/// Continue differencing `future` from the end of `history`.
///
/// Returns one differenced value per entry of `future`.
pub fn difference_continuing(history: &[f64], future: &[f64], d: usize) -> Result<Vec<f64>> {
    let mut state = DifferenceState::from_history(history, d)?;
    Ok(future.iter().map(|&v| state.difference_next(v)).collect())
}

/// Check if a series needs differencing using a simple variance ratio test.
///
/// # Returns
/// Suggested differencing order (0, 1, or 2).
pub fn suggest_differencing(series: &[f64]) -> usize {
    if series.len() < 3 {
        return 0;
    }

    let var_0 = variance(series);
    let diff_1 = difference(series, 1);

    if diff_1.len() < 2 {
        return 0;
    }

    let var_1 = variance(&diff_1);

    // Differencing is needed when it removes a good share of the variance
    if var_0 > 0.0 && var_1 / var_0 < 0.9 {
        let diff_2 = difference(&diff_1, 1);
        if diff_2.len() >= 2 {
            let var_2 = variance(&diff_2);
            if var_2 / var_1 < 0.9 && var_2 < var_0 {
                return 2;
            }
        }
        return 1;
    }

    0
}

fn variance(series: &[f64]) -> f64 {
    crate::utils::stats::variance(series)
}
