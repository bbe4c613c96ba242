//! # seawave-forecast
//!
//! Hybrid sea-wave height forecasting.
//!
//! An ARIMAX model with wind speed as exogenous regressor captures the
//! linear dynamics of wave height; a small GRU trained on the standardized
//! ARIMAX residuals adds a non-linear correction. The two forecasts are
//! summed and scored with MAPE against held-out observations.
//!
//! Also provides order selection, stationarity and residual diagnostics,
//! and accuracy metrics.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod hybrid;
pub mod models;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{HybridForecast, HybridPrediction, Observation, SplitConfig};
    pub use crate::error::{ForecastError, Result};
    pub use crate::hybrid::{EvaluationReport, FitReport, HybridConfig, HybridForecaster};
    pub use crate::models::{
        ArimaxEstimator, ArimaxOrder, GruResidualModel, OlsArimax, RecurrentConfig, ResidualModel,
    };
    pub use crate::transform::{Scaler, StandardScaler};
    pub use crate::utils::{calculate_metrics, AccuracyMetrics, CancellationToken};
}
