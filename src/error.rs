//! Error types for the seawave-forecast library.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while fitting or running the hybrid forecaster.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A NaN or infinite value was found in the input.
    #[error("non-finite value at index {index}")]
    NonFinite { index: usize },

    /// Standard deviation at or below the stability threshold.
    #[error("degenerate scale: std {std:e} is not above threshold {threshold:e}")]
    DegenerateScale { std: f64, threshold: f64 },

    /// Singular or ill-conditioned system in parameter estimation.
    #[error("model fit failed: {matrix} is ill-conditioned (condition indicator {condition:e})")]
    ModelFit {
        matrix: &'static str,
        condition: f64,
    },

    /// Prediction window length differs from the trained window.
    #[error("window size mismatch: expected {expected}, got {got}")]
    WindowSizeMismatch { expected: usize, got: usize },

    /// A step was invoked before the step it depends on completed.
    #[error("not fitted: {0}")]
    NotFitted(&'static str),

    /// Hyperparameter outside its valid domain.
    #[error("invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    /// Training was cancelled or hit its deadline.
    #[error("training cancelled")]
    Cancelled,

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}

/// Return `NonFinite` for the first NaN or infinite entry.
pub(crate) fn ensure_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ForecastError::NonFinite { index }),
        None => Ok(()),
    }
}
