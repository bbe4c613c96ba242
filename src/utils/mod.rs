//! Utility functions shared by the models and the orchestrator.

pub mod cancel;
pub mod metrics;
pub mod ols;
pub mod stats;

pub use cancel::CancellationToken;
pub use metrics::{absolute_percentage_error, calculate_metrics, mape, AccuracyMetrics};
pub use ols::{ols_solve, OlsSolution};
pub use stats::quantile_normal;
