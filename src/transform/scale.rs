//! Z-score standardization with explicit fit-time parameters.
//!
//! Parameters are fitted once on a training slice and then applied to
//! validation, test and future inputs, so those series never influence
//! `mean` or `std`.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ForecastError, Result};
use crate::utils::stats::{mean, population_variance};

/// Standard deviations at or below this are treated as degenerate.
pub const MIN_STD_THRESHOLD: f64 = 1e-8;

/// Fitted standardization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// Mean of the fitted series.
    pub mean: f64,
    /// Population standard deviation of the fitted series.
    pub std: f64,
}

impl ScalerParams {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

/// Diagnostic view of a parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerDescription {
    pub mean: f64,
    pub std: f64,
    pub variance: f64,
    pub stable: bool,
    pub min_std_threshold: f64,
}

/// Capability contract for a series scaler.
pub trait Scaler {
    /// Fit parameters on `data` and return the scaled series with them.
    fn fit_transform_standard(&self, data: &[f64]) -> Result<(Vec<f64>, ScalerParams)>;

    /// Apply already-fitted parameters without refitting.
    fn transform_standard(&self, data: &[f64], params: &ScalerParams) -> Result<Vec<f64>>;

    /// Map scaled values back to the original units.
    fn inverse_transform_standard(&self, scaled: &[f64], params: &ScalerParams) -> Vec<f64>;

    /// Whether `params` can be divided by safely.
    fn is_stable(&self, params: &ScalerParams) -> bool;

    /// Validated copy of `params`.
    fn get_params(&self, params: &ScalerParams) -> Result<ScalerParams>;

    /// Derived statistics for diagnostics.
    fn describe(&self, params: &ScalerParams) -> ScalerDescription;
}

/// Z-score scaler using the population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardScaler {
    threshold: f64,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self {
            threshold: MIN_STD_THRESHOLD,
        }
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different stability threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn require_stable(&self, params: &ScalerParams) -> Result<()> {
        if self.is_stable(params) {
            Ok(())
        } else {
            Err(ForecastError::DegenerateScale {
                std: params.std,
                threshold: self.threshold,
            })
        }
    }
}

impl Scaler for StandardScaler {
    fn fit_transform_standard(&self, data: &[f64]) -> Result<(Vec<f64>, ScalerParams)> {
        if data.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        ensure_finite(data)?;

        let mean = mean(data);
        let params = ScalerParams::new(mean, population_variance(data).sqrt());

        self.require_stable(&params)?;

        let scaled = data.iter().map(|&x| (x - mean) / params.std).collect();
        Ok((scaled, params))
    }

    fn transform_standard(&self, data: &[f64], params: &ScalerParams) -> Result<Vec<f64>> {
        self.require_stable(params)?;
        ensure_finite(data)?;
        Ok(data
            .iter()
            .map(|&x| (x - params.mean) / params.std)
            .collect())
    }

    fn inverse_transform_standard(&self, scaled: &[f64], params: &ScalerParams) -> Vec<f64> {
        scaled
            .iter()
            .map(|&x| x * params.std + params.mean)
            .collect()
    }

    fn is_stable(&self, params: &ScalerParams) -> bool {
        params.std.is_finite() && params.std > self.threshold
    }

    fn get_params(&self, params: &ScalerParams) -> Result<ScalerParams> {
        if !params.mean.is_finite() {
            return Err(ForecastError::NonFinite { index: 0 });
        }
        if !params.std.is_finite() {
            return Err(ForecastError::NonFinite { index: 1 });
        }
        self.require_stable(params)?;
        Ok(*params)
    }

    fn describe(&self, params: &ScalerParams) -> ScalerDescription {
        ScalerDescription {
            mean: params.mean,
            std: params.std,
            variance: params.std * params.std,
            stable: self.is_stable(params),
            min_std_threshold: self.threshold,
        }
    }
}
