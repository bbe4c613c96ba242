//! Residual diagnostic tests for fitted ARIMAX models.
//!
//! Provides tests to validate model residuals are white noise and roughly
//! normal.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::utils::stats::{kurtosis, skewness};

/// Ljung-Box test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// P-value from the chi-squared distribution
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
    /// Degrees of freedom
    pub df: usize,
}

impl LjungBoxResult {
    /// Check if residuals pass at given significance level.
    /// Returns true if we fail to reject null (residuals are white noise).
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Perform Ljung-Box test for autocorrelation in residuals.
///
/// Tests null hypothesis that residuals are independently distributed (white noise).
///
/// # Arguments
/// * `residuals` - Model residuals
/// * `lags` - Number of lags to include (default: min(10, n/5))
/// * `fitted_params` - Number of fitted parameters (for degrees of freedom adjustment)
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    let n = residuals.len();

    if n < 3 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            df: 0,
        };
    }

    let lags = lags.unwrap_or_else(|| 10.min(n / 5).max(1));
    let lags = lags.min(n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);

    let mean: f64 = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|&x| x - mean).collect();

    let var: f64 = centered.iter().map(|&x| x * x).sum::<f64>();
    if var == 0.0 {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        };
    }

    let mut q = 0.0;
    for k in 1..=lags {
        let acf_k: f64 = centered
            .iter()
            .skip(k)
            .zip(centered.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / var;

        q += (acf_k * acf_k) / (n - k) as f64;
    }
    q *= n as f64 * (n + 2) as f64;

    LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, df),
        lags,
        df,
    }
}

/// Moment-based normality check of residuals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    /// Sample skewness.
    pub skewness: f64,
    /// Sample kurtosis (3 for a normal distribution).
    pub kurtosis: f64,
    /// Jarque-Bera statistic.
    pub jarque_bera: f64,
    /// P-value of the Jarque-Bera statistic under chi-squared(2).
    pub p_value: f64,
    /// `|skewness| < 1` and `|kurtosis - 3| < 2`.
    pub is_normal: bool,
}

/// Skewness/kurtosis screen plus a Jarque-Bera statistic.
pub fn normality_test(residuals: &[f64]) -> NormalityResult {
    let n = residuals.len();
    let skew = skewness(residuals);
    let kurt = kurtosis(residuals);

    if n < 3 {
        return NormalityResult {
            skewness: skew,
            kurtosis: kurt,
            jarque_bera: f64::NAN,
            p_value: f64::NAN,
            is_normal: false,
        };
    }

    let jb = n as f64 / 6.0 * (skew * skew + (kurt - 3.0).powi(2) / 4.0);

    NormalityResult {
        skewness: skew,
        kurtosis: kurt,
        jarque_bera: jb,
        p_value: chi_squared_sf(jb, 2),
        is_normal: skew.abs() < 1.0 && (kurt - 3.0).abs() < 2.0,
    }
}

/// Chi-squared survival function (1 - CDF).
fn chi_squared_sf(x: f64, df: usize) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 || df == 0 {
        return 1.0;
    }
    ChiSquared::new(df as f64)
        .map(|dist| 1.0 - dist.cdf(x))
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn uniform_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    #[test]
    fn ljung_box_white_noise_passes() {
        let result = ljung_box(&uniform_noise(300, 3), Some(10), 0);
        assert_eq!(result.lags, 10);
        assert!(result.is_white_noise(0.01));
    }

    #[test]
    fn ljung_box_detects_autocorrelation() {
        let mut series = vec![0.0; 200];
        let noise = uniform_noise(200, 5);
        for t in 1..200 {
            series[t] = 0.9 * series[t - 1] + noise[t];
        }
        let result = ljung_box(&series, Some(5), 0);
        assert!(!result.is_white_noise(0.05));
    }

    #[test]
    fn ljung_box_short_and_constant() {
        assert!(ljung_box(&[1.0, 2.0], None, 0).statistic.is_nan());
        let constant = ljung_box(&[1.0; 20], None, 0);
        assert_relative_eq!(constant.p_value, 1.0);
    }

    #[test]
    fn ljung_box_adjusts_degrees_of_freedom() {
        let result = ljung_box(&uniform_noise(50, 1), Some(6), 2);
        assert_eq!(result.df, 4);
    }

    #[test]
    fn normality_of_symmetric_noise() {
        let result = normality_test(&uniform_noise(500, 11));
        assert!(result.skewness.abs() < 0.3);
        // uniform kurtosis is 1.8, still inside the screen
        assert!(result.is_normal);
        assert!(result.jarque_bera > 0.0);
    }

    #[test]
    fn heavy_outlier_fails_normality() {
        let mut residuals = vec![0.1, -0.1, 0.05, -0.05, 0.0, 0.1, -0.1, 0.05, -0.05, 0.0];
        residuals.push(50.0);
        let result = normality_test(&residuals);
        assert!(!result.is_normal);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn chi_squared_survival_edges() {
        assert_relative_eq!(chi_squared_sf(0.0, 3), 1.0);
        assert_relative_eq!(chi_squared_sf(5.991, 2), 0.05, epsilon = 1e-3);
    }
}
