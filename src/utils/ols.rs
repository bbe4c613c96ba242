//! Ordinary Least Squares on an explicit design matrix.
//!
//! The ARIMAX estimators and the Hannan-Rissanen first stage build their
//! design rows themselves and hand them here. The normal equations are
//! solved by Cholesky; an ill-conditioned `XᵀX` is reported, never patched
//! with a ridge term.

use crate::error::{ForecastError, Result};

/// Pivot ratio above which `XᵀX` is treated as numerically singular.
pub const MAX_CONDITION: f64 = 1e12;

/// Fitted OLS system.
#[derive(Debug, Clone)]
pub struct OlsSolution {
    /// Coefficients in design-column order.
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients (NaN without residual degrees of freedom).
    pub std_errors: Vec<f64>,
    /// In-sample residuals `y - Xb`.
    pub residuals: Vec<f64>,
    /// Sum of squared residuals.
    pub sse: f64,
    /// Largest over smallest Cholesky pivot of `XᵀX`.
    pub condition: f64,
}

impl OlsSolution {
    /// Number of observations the system was fitted on.
    pub fn n_obs(&self) -> usize {
        self.residuals.len()
    }

    /// Coefficient over standard error, per column.
    pub fn z_scores(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.std_errors)
            .map(|(b, se)| if *se > 0.0 { b / se } else { f64::NAN })
            .collect()
    }
}

/// Fit `y = X b` by least squares.
///
/// Every row of `design` must have the same width. Fails with
/// [`ForecastError::ModelFit`] when `XᵀX` is not positive definite or its
/// pivot ratio exceeds [`MAX_CONDITION`].
pub fn ols_solve(design: &[Vec<f64>], y: &[f64]) -> Result<OlsSolution> {
    let n = y.len();
    if n == 0 || design.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if design.len() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: design.len(),
        });
    }

    let k = design[0].len();
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if let Some(row) = design.iter().find(|row| row.len() != k) {
        return Err(ForecastError::DimensionMismatch {
            expected: k,
            got: row.len(),
        });
    }
    if n < k {
        return Err(ForecastError::InsufficientData { needed: k, got: n });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];

    for (row, &target) in design.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
    }

    let factor = cholesky(&xtx).ok_or(ForecastError::ModelFit {
        matrix: "XtX",
        condition: f64::INFINITY,
    })?;

    if factor.condition > MAX_CONDITION || !factor.condition.is_finite() {
        return Err(ForecastError::ModelFit {
            matrix: "XtX",
            condition: factor.condition,
        });
    }

    let coefficients = factor.solve(&xty);

    let residuals: Vec<f64> = design
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
            target - fitted
        })
        .collect();
    let sse: f64 = residuals.iter().map(|r| r * r).sum();

    let std_errors = if n > k {
        let sigma2 = sse / (n - k) as f64;
        (0..k)
            .map(|i| {
                let mut unit = vec![0.0; k];
                unit[i] = 1.0;
                let col = factor.solve(&unit);
                (sigma2 * col[i]).max(0.0).sqrt()
            })
            .collect()
    } else {
        vec![f64::NAN; k]
    };

    Ok(OlsSolution {
        coefficients,
        std_errors,
        residuals,
        sse,
        condition: factor.condition,
    })
}

/// Lower Cholesky factor with its pivot ratio.
struct Cholesky {
    l: Vec<Vec<f64>>,
    condition: f64,
}

impl Cholesky {
    /// Solve `L Lᵀ x = b`.
    fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = b.len();
        let l = &self.l;

        // Forward substitution: L @ y = b
        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = b[i];
            for j in 0..i {
                sum -= l[i][j] * y[j];
            }
            y[i] = sum / l[i][i];
        }

        // Backward substitution: L' @ x = y
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = y[i];
            for j in (i + 1)..n {
                sum -= l[j][i] * x[j];
            }
            x[i] = sum / l[i][i];
        }

        x
    }
}

/// Factor a symmetric matrix; `None` if it is not positive definite.
fn cholesky(a: &[Vec<f64>]) -> Option<Cholesky> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];
    let mut max_pivot = 0.0_f64;
    let mut min_pivot = f64::INFINITY;

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                max_pivot = max_pivot.max(sum);
                min_pivot = min_pivot.min(sum);
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(Cholesky {
        l,
        condition: max_pivot / min_pivot,
    })
}
