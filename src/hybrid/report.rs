//! Summaries produced by a fitted session.

use serde::{Deserialize, Serialize};

use crate::core::HybridPrediction;
use crate::models::{ArimaxOrder, TrainingHistory};
use crate::transform::{ScalerDescription, ScalerParams};
use crate::utils::AccuracyMetrics;
use crate::validation::{LjungBoxResult, NormalityResult, StationarityReport};

/// State of every fitted component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub estimator: String,
    pub order: ArimaxOrder,
    pub intercept: f64,
    pub phi: Vec<f64>,
    pub theta: Vec<f64>,
    pub beta_x: f64,
    /// Standard errors in coefficient order `[c, φ.., θ.., β]`.
    pub std_errors: Vec<f64>,
    pub sigma2: f64,
    pub aic: f64,
    pub bic: f64,
    pub normality: NormalityResult,
    pub ljung_box: LjungBoxResult,
    pub wave_height_scaler: ScalerParams,
    pub wind_speed_scaler: ScalerParams,
    pub residual_scaler: ScalerDescription,
    pub training: TrainingHistory,
    /// Stationarity of the training wave heights.
    pub stationarity: StationarityReport,
}

/// ARIMAX-only and hybrid MAPE over one holdout split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitScore {
    pub rows: usize,
    pub arimax_mape: Option<f64>,
    pub hybrid_mape: Option<f64>,
}

/// Holdout evaluation of a fitted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub validation: SplitScore,
    pub test: SplitScore,
    /// Full accuracy metrics of the hybrid forecast on the test split.
    pub test_metrics: Option<AccuracyMetrics>,
    /// One record per test row.
    pub records: Vec<HybridPrediction>,
}

impl EvaluationReport {
    /// Whether the residual correction lowered test MAPE.
    pub fn hybrid_improves(&self) -> Option<bool> {
        Some(self.test.hybrid_mape? < self.test.arimax_mape?)
    }
}
