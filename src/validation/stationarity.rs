//! Stationarity tests for wave-height series.
//!
//! Provides ADF and KPSS tests and a combined report over a series and its
//! first difference, used to pick the differencing order.

use serde::{Deserialize, Serialize};

use crate::models::arimax::diff::{difference, suggest_differencing};
use crate::utils::ols::ols_solve;
use crate::utils::stats::{acf, pacf};

/// Result of a stationarity test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value (approximate)
    pub p_value: f64,
    /// Number of lags used
    pub lags: usize,
    /// Whether series appears stationary
    pub is_stationary: bool,
    /// Critical values at common significance levels
    pub critical_values: CriticalValues,
}

impl StationarityResult {
    fn undefined(lags: usize) -> Self {
        Self {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            is_stationary: false,
            critical_values: CriticalValues::default(),
        }
    }
}

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

/// Augmented Dickey-Fuller test for a unit root.
///
/// Regresses `Δy_t = α + β·y_{t-1} + Σγ_i·Δy_{t-i}` and reports the t-statistic
/// of `β`. The augmentation order is chosen by AIC up to `max_lags`
/// (default `(n-1)^(1/3)`). Rejection implies stationarity.
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> StationarityResult {
    let n = series.len();

    if n < 8 {
        return StationarityResult::undefined(0);
    }

    let max_lags = max_lags.unwrap_or_else(|| ((n - 1) as f64).powf(1.0 / 3.0).floor() as usize);
    let max_lags = max_lags.min(n / 4).max(1);

    let diff = difference(series, 1);

    // Fix the sample at the largest lag so AIC values are comparable
    let start = max_lags;
    let mut best: Option<(usize, f64, f64, f64)> = None;

    for lag in 0..=max_lags {
        let mut design = Vec::with_capacity(diff.len() - start);
        let mut target = Vec::with_capacity(diff.len() - start);
        for t in start..diff.len() {
            let mut row = Vec::with_capacity(2 + lag);
            row.push(1.0);
            row.push(series[t]);
            for i in 1..=lag {
                row.push(diff[t - i]);
            }
            design.push(row);
            target.push(diff[t]);
        }

        let Ok(fit) = ols_solve(&design, &target) else {
            continue;
        };
        let m = fit.n_obs() as f64;
        if fit.sse <= 0.0 || fit.std_errors[1].is_nan() {
            continue;
        }
        let aic = m * (fit.sse / m).ln() + 2.0 * (lag + 2) as f64;
        if best.map_or(true, |(_, best_aic, _, _)| aic < best_aic) {
            best = Some((lag, aic, fit.coefficients[1], fit.std_errors[1]));
        }
    }

    let Some((lag, _, beta, se)) = best else {
        return StationarityResult::undefined(0);
    };
    if se == 0.0 {
        return StationarityResult::undefined(lag);
    }

    let t_stat = beta / se;

    // MacKinnon critical values, constant and no trend
    let critical_values = CriticalValues {
        cv_1pct: -3.43,
        cv_5pct: -2.86,
        cv_10pct: -2.57,
    };

    StationarityResult {
        statistic: t_stat,
        p_value: adf_p_value(t_stat),
        lags: lag,
        is_stationary: t_stat < critical_values.cv_5pct,
        critical_values,
    }
}

/// Approximate p-value for the ADF statistic from a step table.
fn adf_p_value(t_stat: f64) -> f64 {
    if t_stat.is_nan() {
        return f64::NAN;
    }

    if t_stat < -4.0 {
        0.001
    } else if t_stat < -3.43 {
        0.01
    } else if t_stat < -2.86 {
        0.05
    } else if t_stat < -2.57 {
        0.10
    } else if t_stat < -1.94 {
        0.20
    } else if t_stat < -1.62 {
        0.30
    } else if t_stat < -1.28 {
        0.40
    } else if t_stat < -0.84 {
        0.50
    } else if t_stat < 0.0 {
        0.70
    } else {
        0.90 + 0.05 * (1.0 - (-t_stat).exp())
    }
}

/// KPSS test for level stationarity.
///
/// Tests null hypothesis that series is stationary around its mean.
/// Rejection implies non-stationarity.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Number of lags for HAC variance (default: 4*(n/100)^0.25)
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> StationarityResult {
    let n = series.len();

    if n < 4 {
        return StationarityResult::undefined(0);
    }

    let lags = lags.unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize);
    let lags = lags.min(n / 2).max(1);

    let mean: f64 = series.iter().sum::<f64>() / n as f64;
    let residuals: Vec<f64> = series.iter().map(|&x| x - mean).collect();

    let numerator: f64 = residuals
        .iter()
        .scan(0.0, |acc, &r| {
            *acc += r;
            Some(*acc * *acc)
        })
        .sum::<f64>()
        / (n * n) as f64;

    // HAC variance with Bartlett weights
    let mut variance = residuals.iter().map(|&r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocovar: f64 = residuals
            .iter()
            .skip(j)
            .zip(residuals.iter())
            .map(|(&a, &b)| a * b)
            .sum::<f64>()
            / n as f64;
        variance += 2.0 * weight * autocovar;
    }

    if variance <= 0.0 {
        return StationarityResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
            is_stationary: true,
            critical_values: CriticalValues::default(),
        };
    }

    let stat = numerator / variance;

    let critical_values = CriticalValues {
        cv_1pct: 0.739,
        cv_5pct: 0.463,
        cv_10pct: 0.347,
    };

    StationarityResult {
        statistic: stat,
        p_value: kpss_p_value(stat),
        lags,
        is_stationary: stat < critical_values.cv_5pct,
        critical_values,
    }
}

fn kpss_p_value(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }

    if stat < 0.347 {
        0.10 + 0.90 * (1.0 - stat / 0.347)
    } else if stat < 0.463 {
        0.05 + 0.05 * (0.463 - stat) / (0.463 - 0.347)
    } else if stat < 0.739 {
        0.01 + 0.04 * (0.739 - stat) / (0.739 - 0.463)
    } else {
        0.01 * (1.0 - (stat - 0.739).min(1.0))
    }
}

/// Verdict from combining ADF and KPSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationarityVerdict {
    /// ADF rejects a unit root and KPSS does not reject stationarity.
    Stationary,
    /// ADF fails to reject and KPSS rejects.
    NonStationary,
    /// The two tests disagree.
    Inconclusive,
}

impl StationarityVerdict {
    fn from_tests(adf: &StationarityResult, kpss: &StationarityResult) -> Self {
        match (adf.is_stationary, kpss.is_stationary) {
            (true, true) => StationarityVerdict::Stationary,
            (false, false) => StationarityVerdict::NonStationary,
            _ => StationarityVerdict::Inconclusive,
        }
    }
}

/// Stationarity report over a series and its first difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    pub level_adf: StationarityResult,
    pub level_kpss: StationarityResult,
    pub level_verdict: StationarityVerdict,
    pub differenced_adf: StationarityResult,
    pub differenced_kpss: StationarityResult,
    pub differenced_verdict: StationarityVerdict,
    /// Differencing order suggested by the variance-ratio heuristic.
    pub suggested_d: usize,
    /// ACF of the first difference, lags `0..=max_lag`.
    pub acf: Vec<f64>,
    /// PACF of the first difference, lags `1..=max_lag`.
    pub pacf: Vec<f64>,
}

/// Run ADF and KPSS on `series` and on its first difference.
pub fn stationarity_report(series: &[f64], max_lag: usize) -> StationarityReport {
    let diff = difference(series, 1);

    let level_adf = adf_test(series, None);
    let level_kpss = kpss_test(series, None);
    let differenced_adf = adf_test(&diff, None);
    let differenced_kpss = kpss_test(&diff, None);

    StationarityReport {
        level_verdict: StationarityVerdict::from_tests(&level_adf, &level_kpss),
        differenced_verdict: StationarityVerdict::from_tests(&differenced_adf, &differenced_kpss),
        level_adf,
        level_kpss,
        differenced_adf,
        differenced_kpss,
        suggested_d: suggest_differencing(series),
        acf: acf(&diff, max_lag),
        pacf: pacf(&diff, max_lag),
    }
}
