//! Sliding windows for sequence models.

use crate::error::{ForecastError, Result};

/// Inputs and next-step targets cut from one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequences {
    /// Overlapping input windows, each of the requested length.
    pub inputs: Vec<Vec<f64>>,
    /// Value immediately following each window.
    pub targets: Vec<f64>,
}

impl Sequences {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Cut `series` into overlapping `window`-length inputs, each paired with
/// the value that follows it.
///
/// A series of length `n` yields `n - window` samples.
pub fn create_sequences(series: &[f64], window: usize) -> Result<Sequences> {
    if window == 0 {
        return Err(ForecastError::InvalidHyperparameter(
            "window must be positive".into(),
        ));
    }
    if series.len() <= window {
        return Err(ForecastError::InsufficientData {
            needed: window + 1,
            got: series.len(),
        });
    }

    let (inputs, targets) = series
        .windows(window + 1)
        .map(|w| (w[..window].to_vec(), w[window]))
        .unzip();

    Ok(Sequences { inputs, targets })
}

/// The trailing `window` values of `series`.
pub fn last_window(series: &[f64], window: usize) -> Result<&[f64]> {
    if series.len() < window {
        return Err(ForecastError::InsufficientData {
            needed: window,
            got: series.len(),
        });
    }
    Ok(&series[series.len() - window..])
}
