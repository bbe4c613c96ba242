//! ARIMAX(p, d, q) estimated by ordinary least squares.
//!
//! The differenced target is regressed on an intercept, `p` of its own lags
//! and the equally differenced exogenous series:
//!
//! ```text
//! Δᵈy_t = c + Σ φ_i·Δᵈy_{t-i} + β·Δᵈx_t + ε_t
//! ```
//!
//! Forecasts are produced one step at a time with an explicit lag buffer and
//! integrated back to the original scale through [`DifferenceState`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ensure_finite, ForecastError, Result};
use crate::models::arimax::diff::{difference, difference_continuing, DifferenceState};
use crate::models::ArimaxEstimator;
use crate::utils::ols::{ols_solve, OlsSolution};
use crate::validation::residual_tests::{normality_test, NormalityResult};

/// Highest supported differencing order.
pub const MAX_DIFFERENCING: usize = 2;

/// ARIMAX model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ArimaxOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaxOrder {
    /// Create a new ARIMAX order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Intercept, AR, MA and exogenous coefficients of the full order.
    ///
    /// Information criteria count the coefficients actually estimated, so
    /// an [`OlsArimax`] fit with `q > 0` uses `p + 2` rather than this.
    pub fn num_params(&self) -> usize {
        1 + self.p + self.q + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.d > MAX_DIFFERENCING {
            return Err(ForecastError::InvalidHyperparameter(format!(
                "differencing order d={} exceeds {MAX_DIFFERENCING}",
                self.d
            )));
        }
        Ok(())
    }
}

impl Default for ArimaxOrder {
    fn default() -> Self {
        Self::new(1, 1, 0)
    }
}

impl std::fmt::Display for ArimaxOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMAX({},{},{})", self.p, self.d, self.q)
    }
}

/// Fitted ARIMAX state. Immutable once built by an estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaxFit {
    order: ArimaxOrder,
    intercept: f64,
    phi: Vec<f64>,
    theta: Vec<f64>,
    beta_x: f64,
    std_errors: Vec<f64>,
    fitted: Vec<f64>,
    fit_start: usize,
    residuals: Vec<f64>,
    innovations: Vec<f64>,
    sigma2: f64,
    aic: f64,
    bic: f64,
    condition: f64,
    normality: NormalityResult,
}

impl ArimaxFit {
    /// Assemble a fit from an OLS solution over columns
    /// `[1, φ_1..φ_p, θ_1..θ_q, β]`.
    ///
    /// `start` is the first differenced index used as a regression target.
    pub(crate) fn from_solution(
        order: ArimaxOrder,
        y: &[f64],
        p: usize,
        q: usize,
        start: usize,
        solution: OlsSolution,
    ) -> Self {
        let coef = &solution.coefficients;
        let fit_start = order.d + start;

        let mut fitted = y.to_vec();
        for (i, r) in solution.residuals.iter().enumerate() {
            fitted[fit_start + i] = y[fit_start + i] - r;
        }

        let m = solution.residuals.len() as f64;
        let k = coef.len() as f64;
        let sigma2 = solution.sse / m;
        let log_term = sigma2.max(f64::MIN_POSITIVE).ln();

        let innovations = solution.residuals[solution.residuals.len().saturating_sub(q)..].to_vec();
        let normality = normality_test(&solution.residuals);

        Self {
            order,
            intercept: coef[0],
            phi: coef[1..1 + p].to_vec(),
            theta: coef[1 + p..1 + p + q].to_vec(),
            beta_x: coef[1 + p + q],
            std_errors: solution.std_errors,
            fitted,
            fit_start,
            innovations,
            sigma2,
            aic: m * log_term + 2.0 * k,
            bic: m * log_term + k * m.ln(),
            condition: solution.condition,
            normality,
            residuals: solution.residuals,
        }
    }

    /// Order requested at training time.
    pub fn order(&self) -> ArimaxOrder {
        self.order
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// AR coefficients.
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// MA coefficients; empty when the estimator ignores `q`.
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Exogenous coefficient.
    pub fn beta_x(&self) -> f64 {
        self.beta_x
    }

    /// Standard errors in `[intercept, phi.., theta.., beta_x]` order.
    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    /// `|coef / se|` for the AR then MA coefficients.
    pub fn arma_z_scores(&self) -> Vec<f64> {
        self.phi
            .iter()
            .chain(&self.theta)
            .zip(&self.std_errors[1..])
            .map(|(c, se)| (c / se).abs())
            .collect()
    }

    /// One-step-ahead fitted values on the original scale, one per
    /// training point. Points before [`fit_start`](Self::fit_start) echo the
    /// actual value.
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    /// Index of the first training point with a genuine fitted value.
    pub fn fit_start(&self) -> usize {
        self.fit_start
    }

    /// `actual - fitted` for every point from `fit_start` on.
    ///
    /// A one-step-ahead error on the original scale equals the error of the
    /// differenced equation, so these are also the regression residuals.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Trailing innovations carried into the MA part of a forecast.
    pub fn innovations(&self) -> &[f64] {
        &self.innovations
    }

    /// Residual variance (SSE / m).
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Pivot ratio of the normal equations.
    pub fn condition(&self) -> f64 {
        self.condition
    }

    pub fn normality(&self) -> &NormalityResult {
        &self.normality
    }

    /// Stationary AR part and invertible MA part, coefficient-wise.
    pub fn is_stable(&self) -> bool {
        self.phi.iter().chain(&self.theta).all(|c| c.abs() < 1.0)
    }
}

/// Fixed-capacity history of the most recent values.
///
/// Holds the last `p` differenced values during a recursive forecast; every
/// step reads its lags and then pushes its own prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl ForecastBuffer {
    /// Seed the buffer with the tail of `history`.
    pub fn from_history(history: &[f64], capacity: usize) -> Self {
        let skip = history.len().saturating_sub(capacity);
        Self {
            values: history[skip..].iter().copied().collect(),
            capacity,
        }
    }

    /// Append a value, dropping the oldest when full.
    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// `lag(1)` is the most recent value. Missing lags read as zero.
    pub fn lag(&self, k: usize) -> f64 {
        if k == 0 || k > self.values.len() {
            return 0.0;
        }
        self.values[self.values.len() - k]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

/// Plain AR + exogenous estimator.
///
/// Moving-average terms have no place in a single OLS pass, so `q` is
/// recorded in the fitted order but produces no coefficients; use
/// [`HannanRissanenArimax`](super::HannanRissanenArimax) when `q > 0` matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct OlsArimax;

impl OlsArimax {
    pub fn new() -> Self {
        Self
    }
}

impl ArimaxEstimator for OlsArimax {
    fn train(&self, y: &[f64], x: &[f64], order: ArimaxOrder) -> Result<ArimaxFit> {
        validate_inputs(y, x, order)?;
        if order.q > 0 {
            warn!(q = order.q, "OLS estimator ignores moving-average order");
        }

        let (p, d) = (order.p, order.d);
        let columns = p + 2;
        let needed = d + p + columns + 1;
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        let y_d = difference(y, d);
        let x_d = difference(x, d);
        let (design, target) = design_rows(&y_d, &x_d, p, &[], 0, p);
        let solution = ols_solve(&design, &target)?;

        let fit = ArimaxFit::from_solution(order, y, p, 0, p, solution);
        debug!(
            p,
            d,
            beta_x = fit.beta_x(),
            aic = fit.aic(),
            "ARIMAX fitted by OLS"
        );
        Ok(fit)
    }

    fn name(&self) -> &str {
        "ARIMAX-OLS"
    }
}

/// Common input checks for ARIMAX estimators.
pub(crate) fn validate_inputs(y: &[f64], x: &[f64], order: ArimaxOrder) -> Result<()> {
    order.validate()?;
    if y.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if x.len() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: y.len(),
            got: x.len(),
        });
    }
    ensure_finite(y)?;
    ensure_finite(x)
}

/// Regression rows `[1, y_d lags 1..p, innovation lags 1..q, x_d[t]]` with
/// target `y_d[t]`, for `t` in `start..y_d.len()`.
pub(crate) fn design_rows(
    y_d: &[f64],
    x_d: &[f64],
    p: usize,
    innovations: &[f64],
    q: usize,
    start: usize,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let rows = y_d.len().saturating_sub(start);
    let mut design = Vec::with_capacity(rows);
    let mut target = Vec::with_capacity(rows);

    for t in start..y_d.len() {
        let mut row = Vec::with_capacity(p + q + 2);
        row.push(1.0);
        for i in 1..=p {
            row.push(y_d[t - i]);
        }
        for j in 1..=q {
            row.push(innovations[t - j]);
        }
        row.push(x_d[t]);
        design.push(row);
        target.push(y_d[t]);
    }

    (design, target)
}

/// Recursive forecast from explicit coefficients.
///
/// Each step combines the last `p` differenced values, mixing in earlier
/// forecasts as they become history, with the differenced `x_future` entry,
/// then integrates the result `d` times.
pub fn forecast(
    phi: &[f64],
    beta_x: f64,
    intercept: f64,
    y_train: &[f64],
    x_train: &[f64],
    x_future: &[f64],
    p: usize,
    d: usize,
) -> Result<Vec<f64>> {
    if phi.len() != p {
        return Err(ForecastError::DimensionMismatch {
            expected: p,
            got: phi.len(),
        });
    }
    forecast_recursive(phi, &[], &[], beta_x, intercept, y_train, x_train, x_future, d)
}

/// Recursive forecast driven by a fitted model.
pub fn forecast_fit(
    fit: &ArimaxFit,
    y_train: &[f64],
    x_train: &[f64],
    x_future: &[f64],
) -> Result<Vec<f64>> {
    forecast_recursive(
        &fit.phi,
        &fit.theta,
        &fit.innovations,
        fit.beta_x,
        fit.intercept,
        y_train,
        x_train,
        x_future,
        fit.order.d,
    )
}

fn forecast_recursive(
    phi: &[f64],
    theta: &[f64],
    innovations: &[f64],
    beta_x: f64,
    intercept: f64,
    y_train: &[f64],
    x_train: &[f64],
    x_future: &[f64],
    d: usize,
) -> Result<Vec<f64>> {
    if y_train.len() != x_train.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: y_train.len(),
            got: x_train.len(),
        });
    }
    if innovations.len() < theta.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: theta.len(),
            got: innovations.len(),
        });
    }
    ensure_finite(x_future)?;
    if x_future.is_empty() {
        return Ok(Vec::new());
    }

    let p = phi.len();
    let needed = (d + p).max(1);
    if y_train.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: y_train.len(),
        });
    }

    let x_d_future = difference_continuing(x_train, x_future, d)?;
    let mut levels = DifferenceState::from_history(y_train, d)?;
    let mut ar = ForecastBuffer::from_history(&difference(y_train, d), p);
    let mut ma = ForecastBuffer::from_history(innovations, theta.len());

    let mut out = Vec::with_capacity(x_future.len());
    for x_d in x_d_future {
        let mut pred = intercept + beta_x * x_d;
        for (i, coef) in phi.iter().enumerate() {
            pred += coef * ar.lag(i + 1);
        }
        for (j, coef) in theta.iter().enumerate() {
            pred += coef * ma.lag(j + 1);
        }

        ar.push(pred);
        // future shocks have zero expectation
        ma.push(0.0);
        out.push(levels.integrate_next(pred));
    }

    Ok(out)
}
