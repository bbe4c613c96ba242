//! Recorded sea-state observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// One timestamped `(wave_height, wind_speed)` measurement.
///
/// Both values are finite and non-negative. Fields are read-only once the
/// observation is constructed, and deserialization runs the same checks as
/// [`Observation::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawObservation")]
pub struct Observation {
    timestamp: DateTime<Utc>,
    wave_height: f64,
    wind_speed: f64,
}

#[derive(Deserialize)]
struct RawObservation {
    timestamp: DateTime<Utc>,
    wave_height: f64,
    wind_speed: f64,
}

impl TryFrom<RawObservation> for Observation {
    type Error = ForecastError;

    fn try_from(raw: RawObservation) -> Result<Self> {
        Observation::new(raw.timestamp, raw.wave_height, raw.wind_speed)
    }
}

fn check_measurement(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ForecastError::InvalidParameter(format!(
            "{name} must be finite and non-negative, got {value}"
        )));
    }
    Ok(())
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, wave_height: f64, wind_speed: f64) -> Result<Self> {
        check_measurement("wave_height", wave_height)?;
        check_measurement("wind_speed", wind_speed)?;
        Ok(Self {
            timestamp,
            wave_height,
            wind_speed,
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn wave_height(&self) -> f64 {
        self.wave_height
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }
}

/// Training-split row with its standardized values.
///
/// The normalized fields stay `None` until the training split is normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub observation: Observation,
    pub normalized_wave_height: Option<f64>,
    pub normalized_wind_speed: Option<f64>,
}

impl From<Observation> for TrainingRow {
    fn from(observation: Observation) -> Self {
        Self {
            observation,
            normalized_wave_height: None,
            normalized_wind_speed: None,
        }
    }
}

impl TrainingRow {
    pub fn is_normalized(&self) -> bool {
        self.normalized_wave_height.is_some() && self.normalized_wind_speed.is_some()
    }
}
