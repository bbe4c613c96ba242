//! The hybrid forecasting session and its configuration and reports.

mod config;
mod report;
mod session;

pub use config::HybridConfig;
pub use report::{EvaluationReport, FitReport, SplitScore};
pub use session::{HybridForecaster, SessionState};
