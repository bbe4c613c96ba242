//! Two-stage Hannan-Rissanen estimation for ARIMAX models with MA terms.
//!
//! Stage one fits a long autoregression (with the exogenous regressor) and
//! keeps its residuals as innovation estimates. Stage two regresses the
//! differenced target on its own lags, the lagged innovations and the
//! exogenous series. Both stages are plain OLS.

use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::arimax::diff::difference;
use crate::models::arimax::model::{design_rows, validate_inputs, ArimaxFit, ArimaxOrder, OlsArimax};
use crate::models::ArimaxEstimator;
use crate::utils::ols::ols_solve;

/// ARIMAX estimator that honours `q > 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HannanRissanenArimax {
    long_ar_order: Option<usize>,
}

impl HannanRissanenArimax {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the order of the first-stage autoregression.
    pub fn with_long_ar_order(mut self, order: usize) -> Self {
        self.long_ar_order = Some(order);
        self
    }

    fn long_order(&self, n: usize, p: usize, q: usize) -> usize {
        self.long_ar_order
            .unwrap_or_else(|| ((n as f64).ln().ceil() as usize + 1).max(p + q))
            .max(1)
    }
}

impl ArimaxEstimator for HannanRissanenArimax {
    fn train(&self, y: &[f64], x: &[f64], order: ArimaxOrder) -> Result<ArimaxFit> {
        validate_inputs(y, x, order)?;
        if order.q == 0 {
            return OlsArimax.train(y, x, order);
        }

        let (p, d, q) = (order.p, order.d, order.q);
        let m = self.long_order(y.len(), p, q);
        let start = p.max(m + q);

        let stage_one_rows = m + (m + 2) + 1;
        let stage_two_rows = start + (p + q + 2) + 1;
        let needed = d + stage_one_rows.max(stage_two_rows);
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        let y_d = difference(y, d);
        let x_d = difference(x, d);

        let (design, target) = design_rows(&y_d, &x_d, m, &[], 0, m);
        let long_ar = ols_solve(&design, &target)?;

        let mut innovations = vec![0.0; y_d.len()];
        innovations[m..].copy_from_slice(&long_ar.residuals);

        let (design, target) = design_rows(&y_d, &x_d, p, &innovations, q, start);
        let solution = ols_solve(&design, &target)?;

        let fit = ArimaxFit::from_solution(order, y, p, q, start, solution);
        debug!(
            p,
            d,
            q,
            long_ar_order = m,
            aic = fit.aic(),
            "ARIMAX fitted by Hannan-Rissanen"
        );
        Ok(fit)
    }

    fn supports_moving_average(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "ARIMAX-HR"
    }
}
