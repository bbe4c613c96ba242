//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use seawave_forecast::utils::quantile_normal;
///
/// // two-sided 95% -> z ≈ 1.96
/// let z = quantile_normal(0.975);
/// assert!((z - 1.96).abs() < 0.01);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(p))
        .unwrap_or(f64::NAN)
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Population variance (n denominator).
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Calculate the standard deviation of a slice.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Population skewness. Zero for a constant series.
pub fn skewness(values: &[f64]) -> f64 {
    let var = population_variance(values);
    if var.is_nan() || var <= 0.0 {
        return 0.0;
    }
    let m = mean(values);
    let m3 = values.iter().map(|x| (x - m).powi(3)).sum::<f64>() / values.len() as f64;
    m3 / var.powf(1.5)
}

/// Population kurtosis (not excess; a normal sample is close to 3).
pub fn kurtosis(values: &[f64]) -> f64 {
    let var = population_variance(values);
    if var.is_nan() || var <= 0.0 {
        return 3.0;
    }
    let m = mean(values);
    let m4 = values.iter().map(|x| (x - m).powi(4)).sum::<f64>() / values.len() as f64;
    m4 / (var * var)
}

/// Calculate the autocorrelation at a given lag.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return f64::NAN;
    }
    let m = mean(values);
    let n = values.len();

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for i in 0..n {
        denominator += (values[i] - m).powi(2);
        if i >= lag {
            numerator += (values[i] - m) * (values[i - lag] - m);
        }
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Autocorrelation function for lags `0..=max_lag`.
///
/// Lags beyond the series length are omitted.
pub fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let upper = max_lag.min(values.len().saturating_sub(1));
    if values.is_empty() {
        return Vec::new();
    }
    (0..=upper).map(|k| autocorrelation(values, k)).collect()
}

/// Partial autocorrelation for lags `1..=max_lag` via Durbin-Levinson.
pub fn pacf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let rho = acf(values, max_lag);
    let max_lag = rho.len().saturating_sub(1);
    if max_lag == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(max_lag);
    let mut phi_prev: Vec<f64> = Vec::new();

    for k in 1..=max_lag {
        let mut num = rho[k];
        let mut den = 1.0;
        for j in 1..k {
            num -= phi_prev[j - 1] * rho[k - j];
            den -= phi_prev[j - 1] * rho[j];
        }
        let phi_kk = if den.abs() < 1e-12 { 0.0 } else { num / den };

        let mut phi = vec![0.0; k];
        for j in 1..k {
            phi[j - 1] = phi_prev[j - 1] - phi_kk * phi_prev[k - j - 1];
        }
        phi[k - 1] = phi_kk;

        out.push(phi_kk);
        phi_prev = phi;
    }

    out
}
