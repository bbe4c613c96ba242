//! Order identification by grid search.
//!
//! Every `(p, d, q)` in the search box is fitted; candidates that fail to fit,
//! are not stationary/invertible, or carry an insignificant AR/MA coefficient
//! are rejected, and the survivor with the lowest AIC wins.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ForecastError, Result};
use crate::models::arimax::model::{ArimaxFit, ArimaxOrder, MAX_DIFFERENCING};
use crate::models::ArimaxEstimator;
use crate::utils::quantile_normal;

/// Search box and acceptance rule for [`select_order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSearch {
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
    /// Minimum `|coef / se|` for every AR and MA coefficient.
    pub min_z: f64,
}

impl Default for OrderSearch {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 1,
            max_q: 2,
            min_z: quantile_normal(0.975),
        }
    }
}

impl OrderSearch {
    pub fn with_max_p(mut self, max_p: usize) -> Self {
        self.max_p = max_p;
        self
    }

    pub fn with_max_d(mut self, max_d: usize) -> Self {
        self.max_d = max_d;
        self
    }

    pub fn with_max_q(mut self, max_q: usize) -> Self {
        self.max_q = max_q;
        self
    }

    pub fn with_min_z(mut self, min_z: f64) -> Self {
        self.min_z = min_z;
        self
    }
}

/// Why a candidate was not accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    FitFailed(String),
    NotStable,
    Insignificant,
}

/// One row of the search table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub order: ArimaxOrder,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub rejection: Option<Rejection>,
}

impl CandidateEvaluation {
    pub fn accepted(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Outcome of [`select_order`].
#[derive(Debug, Clone)]
pub struct OrderSelection {
    /// Accepted candidate with the lowest AIC.
    pub best: ArimaxFit,
    /// Every candidate in search order.
    pub candidates: Vec<CandidateEvaluation>,
}

/// Grid-search the ARIMAX order for `y` with exogenous `x`.
///
/// `q` is only searched when the estimator supports moving-average terms.
pub fn select_order<E: ArimaxEstimator + ?Sized>(
    estimator: &E,
    y: &[f64],
    x: &[f64],
    search: &OrderSearch,
) -> Result<OrderSelection> {
    if search.max_d > MAX_DIFFERENCING {
        return Err(ForecastError::InvalidHyperparameter(format!(
            "max_d={} exceeds {MAX_DIFFERENCING}",
            search.max_d
        )));
    }
    let max_q = if estimator.supports_moving_average() {
        search.max_q
    } else {
        0
    };

    let mut candidates = Vec::new();
    let mut best: Option<ArimaxFit> = None;

    for d in 0..=search.max_d {
        for p in 0..=search.max_p {
            for q in 0..=max_q {
                let order = ArimaxOrder::new(p, d, q);
                let evaluation = match estimator.train(y, x, order) {
                    Err(err) => CandidateEvaluation {
                        order,
                        aic: None,
                        bic: None,
                        rejection: Some(Rejection::FitFailed(err.to_string())),
                    },
                    Ok(fit) => {
                        let rejection = if !fit.is_stable() {
                            Some(Rejection::NotStable)
                        } else if fit
                            .arma_z_scores()
                            .iter()
                            .any(|z| z.is_nan() || *z < search.min_z)
                        {
                            Some(Rejection::Insignificant)
                        } else {
                            None
                        };

                        let evaluation = CandidateEvaluation {
                            order,
                            aic: Some(fit.aic()),
                            bic: Some(fit.bic()),
                            rejection,
                        };
                        if evaluation.accepted()
                            && best.as_ref().map_or(true, |b| fit.aic() < b.aic())
                        {
                            best = Some(fit);
                        }
                        evaluation
                    }
                };
                debug!(
                    %order,
                    aic = ?evaluation.aic,
                    accepted = evaluation.accepted(),
                    "order candidate"
                );
                candidates.push(evaluation);
            }
        }
    }

    let best = best.ok_or(ForecastError::ModelFit {
        matrix: "order search",
        condition: f64::NAN,
    })?;
    info!(order = %best.order(), aic = best.aic(), "selected ARIMAX order");

    Ok(OrderSelection { best, candidates })
}
