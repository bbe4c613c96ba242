//! Capability traits for the two halves of the hybrid model.

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::models::arimax::{forecast_fit, ArimaxFit, ArimaxOrder};
use crate::models::recurrent::TrainingHistory;
use crate::utils::CancellationToken;

/// Linear ARIMAX estimator.
///
/// Implementations differ in how they estimate coefficients; the recursive
/// forecast is shared and driven entirely by the returned [`ArimaxFit`].
pub trait ArimaxEstimator {
    /// Estimate an ARIMAX model of `order` for `y` with exogenous `x`.
    fn train(&self, y: &[f64], x: &[f64], order: ArimaxOrder) -> Result<ArimaxFit>;

    /// Recursive multi-step forecast on the original scale.
    ///
    /// `y_train` and `x_train` are the series `fit` was trained on; one value
    /// is produced per entry of `x_future`.
    fn forecast(
        &self,
        fit: &ArimaxFit,
        y_train: &[f64],
        x_train: &[f64],
        x_future: &[f64],
    ) -> Result<Vec<f64>> {
        forecast_fit(fit, y_train, x_train, x_future)
    }

    /// Whether `q > 0` produces moving-average terms.
    fn supports_moving_average(&self) -> bool {
        false
    }

    /// Get the estimator name.
    fn name(&self) -> &str;
}

/// Sequence model fitted on standardized ARIMAX residuals.
pub trait ResidualModel {
    /// Read-only snapshot returned by [`get_parameters`](Self::get_parameters).
    type Parameters: Serialize;

    /// Train on a standardized residual series.
    ///
    /// Returns the per-epoch loss history. On error, including cancellation,
    /// the previously trained state is left untouched.
    fn train(&mut self, residuals: &[f64], cancel: &CancellationToken) -> Result<TrainingHistory>;

    /// One-step-ahead prediction from exactly [`window`](Self::window) values.
    fn predict(&self, last_window: &[f64]) -> Result<f64>;

    /// Iterated predictions, feeding each output back into the window.
    fn predict_multiple(&self, last_window: &[f64], steps: usize) -> Result<Vec<f64>> {
        let window = self.window();
        if last_window.len() != window {
            return Err(ForecastError::WindowSizeMismatch {
                expected: window,
                got: last_window.len(),
            });
        }

        let mut buffer = last_window.to_vec();
        let mut predictions = Vec::with_capacity(steps);
        for _ in 0..steps {
            let next = self.predict(&buffer)?;
            predictions.push(next);
            buffer.remove(0);
            buffer.push(next);
        }
        Ok(predictions)
    }

    /// Learned weights and hyperparameters.
    fn get_parameters(&self) -> Result<Self::Parameters>;

    /// Input window length.
    fn window(&self) -> usize;

    /// Check if the model has been trained.
    fn is_fitted(&self) -> bool;

    /// Get the model name.
    fn name(&self) -> &str;
}
