//! Session configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::SplitConfig;
use crate::error::{ForecastError, Result};
use crate::models::{ArimaxOrder, RecurrentConfig};
use crate::transform::MIN_STD_THRESHOLD;

/// Everything a [`HybridForecaster`](crate::hybrid::HybridForecaster) needs.
///
/// Every section falls back to its defaults, so a TOML file only has to name
/// what it changes:
///
/// ```
/// use seawave_forecast::hybrid::HybridConfig;
///
/// let config = HybridConfig::from_toml_str(
///     r#"
///     [arimax]
///     p = 2
///
///     [recurrent]
///     window = 6
///     epochs = 20
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.arimax.p, 2);
/// assert_eq!(config.arimax.d, 1);
/// assert_eq!(config.recurrent.window, 6);
/// assert_eq!(config.recurrent.hidden_size, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub arimax: ArimaxOrder,
    pub recurrent: RecurrentConfig,
    pub split: SplitConfig,
    /// Minimum standard deviation accepted by the scaler.
    pub scaler_threshold: f64,
    /// Highest ACF/PACF lag in the fit report.
    pub diagnostic_lags: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            arimax: ArimaxOrder::default(),
            recurrent: RecurrentConfig::default(),
            split: SplitConfig::default(),
            scaler_threshold: MIN_STD_THRESHOLD,
            diagnostic_lags: 10,
        }
    }
}

impl HybridConfig {
    pub fn with_arimax(mut self, order: ArimaxOrder) -> Self {
        self.arimax = order;
        self
    }

    pub fn with_recurrent(mut self, recurrent: RecurrentConfig) -> Self {
        self.recurrent = recurrent;
        self
    }

    pub fn with_split(mut self, split: SplitConfig) -> Self {
        self.split = split;
        self
    }

    pub fn with_scaler_threshold(mut self, threshold: f64) -> Self {
        self.scaler_threshold = threshold;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        self.arimax.validate()?;
        self.recurrent.validate()?;
        self.split.validate()?;
        if !self.scaler_threshold.is_finite() || self.scaler_threshold < 0.0 {
            return Err(ForecastError::InvalidHyperparameter(format!(
                "scaler_threshold={} must be finite and non-negative",
                self.scaler_threshold
            )));
        }
        Ok(())
    }
}
