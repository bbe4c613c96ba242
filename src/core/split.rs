//! Chronological training/validation/test partitioning.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::observation::{Observation, TrainingRow};
use crate::error::{ForecastError, Result};
use crate::transform::{Scaler, ScalerParams};

/// Absorbs representation error such as `0.7 * 90 = 62.999…`.
const RATIO_EPSILON: f64 = 1e-9;

/// Fractions of the series assigned to training and validation.
///
/// The test split receives the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_ratio: f64,
    pub validation_ratio: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.70,
            validation_ratio: 0.15,
        }
    }
}

impl SplitConfig {
    pub fn new(train_ratio: f64, validation_ratio: f64) -> Self {
        Self {
            train_ratio,
            validation_ratio,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ok = self.train_ratio > 0.0
            && self.validation_ratio >= 0.0
            && self.train_ratio + self.validation_ratio < 1.0;
        if !ok {
            return Err(ForecastError::InvalidHyperparameter(format!(
                "split ratios train={} validation={} must be positive and leave room for a test split",
                self.train_ratio, self.validation_ratio
            )));
        }
        Ok(())
    }

    /// `(train, validation, test)` sizes for a series of length `n`.
    pub fn sizes(&self, n: usize) -> (usize, usize, usize) {
        let floor = |ratio: f64| ((ratio * n as f64) + RATIO_EPSILON).floor() as usize;
        let train = floor(self.train_ratio).min(n);
        let validation = floor(self.validation_ratio).min(n - train);
        (train, validation, n - train - validation)
    }
}

/// The three disjoint partitions of an observation series, in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSplit {
    pub training: Vec<TrainingRow>,
    pub validation: Vec<Observation>,
    pub test: Vec<Observation>,
}

/// Split `observations` by time without shuffling.
///
/// Observations must already be in non-decreasing timestamp order.
pub fn split_observations(observations: &[Observation], config: &SplitConfig) -> Result<SeriesSplit> {
    config.validate()?;
    if observations.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if let Some(i) = observations
        .windows(2)
        .position(|w| w[1].timestamp() < w[0].timestamp())
    {
        return Err(ForecastError::InvalidParameter(format!(
            "observations out of time order at index {}",
            i + 1
        )));
    }

    let (train, validation, test) = config.sizes(observations.len());
    debug!(train, validation, test, "series split");

    Ok(SeriesSplit {
        training: observations[..train].iter().copied().map(TrainingRow::from).collect(),
        validation: observations[train..train + validation].to_vec(),
        test: observations[train + validation..].to_vec(),
    })
}

impl SeriesSplit {
    pub fn len(&self) -> usize {
        self.training.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn training_wave_heights(&self) -> Vec<f64> {
        self.training.iter().map(|r| r.observation.wave_height()).collect()
    }

    pub fn training_wind_speeds(&self) -> Vec<f64> {
        self.training.iter().map(|r| r.observation.wind_speed()).collect()
    }

    /// Validation followed by test observations.
    pub fn holdout(&self) -> impl Iterator<Item = &Observation> {
        self.validation.iter().chain(&self.test)
    }

    /// Fit `scaler` on the training wave heights and wind speeds and fill in
    /// the normalized fields of every training row.
    ///
    /// Returns the `(wave_height, wind_speed)` scaler parameters. On error no
    /// row is modified.
    pub fn normalize_training<S: Scaler + ?Sized>(
        &mut self,
        scaler: &S,
    ) -> Result<(ScalerParams, ScalerParams)> {
        let (waves, wave_params) = scaler.fit_transform_standard(&self.training_wave_heights())?;
        let (winds, wind_params) = scaler.fit_transform_standard(&self.training_wind_speeds())?;

        for ((row, wave), wind) in self.training.iter_mut().zip(waves).zip(winds) {
            row.normalized_wave_height = Some(wave);
            row.normalized_wind_speed = Some(wind);
        }
        Ok((wave_params, wind_params))
    }
}
