//! Statistical validation for fitted models.
//!
//! Provides residual diagnostics and stationarity tests.
//!
//! # Example
//!
//! ```
//! use seawave_forecast::validation::{ljung_box, normality_test, stationarity_report};
//!
//! let residuals = vec![0.1, -0.2, 0.15, -0.1, 0.05, -0.08, 0.12, -0.15, 0.1, -0.05];
//! let lb = ljung_box(&residuals, Some(5), 0);
//! let normality = normality_test(&residuals);
//! assert!(lb.p_value >= 0.0);
//! assert!(normality.skewness.is_finite());
//!
//! let series: Vec<f64> = (0..40).map(|i| 1.0 + 0.1 * i as f64 + (i as f64).sin()).collect();
//! let report = stationarity_report(&series, 5);
//! assert_eq!(report.acf.len(), 6);
//! ```

pub mod residual_tests;
pub mod stationarity;

pub use residual_tests::{ljung_box, normality_test, LjungBoxResult, NormalityResult};
pub use stationarity::{
    adf_test, kpss_test, stationarity_report, CriticalValues, StationarityReport,
    StationarityResult, StationarityVerdict,
};
