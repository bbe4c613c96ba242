//! Forecast outputs handed back to the host application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decimal places kept in a [`HybridPrediction`].
pub const RECORD_DECIMALS: i32 = 4;

fn round_record(value: f64) -> f64 {
    let factor = 10f64.powi(RECORD_DECIMALS);
    (value * factor).round() / factor
}

/// One packaged hybrid forecast.
///
/// Every numeric field is rounded to [`RECORD_DECIMALS`] places on
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridPrediction {
    pub wave_height_in: f64,
    pub wind_speed_in: f64,
    pub arimax_forecast: f64,
    pub lstm_residual_forecast: f64,
    pub hybrid_forecast: f64,
    /// Absolute percentage error in percent, when an actual was available.
    pub mape: Option<f64>,
    pub prediction_timestamp: DateTime<Utc>,
}

impl HybridPrediction {
    pub fn new(
        wave_height_in: f64,
        wind_speed_in: f64,
        arimax_forecast: f64,
        residual_forecast: f64,
        mape: Option<f64>,
        prediction_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            wave_height_in: round_record(wave_height_in),
            wind_speed_in: round_record(wind_speed_in),
            arimax_forecast: round_record(arimax_forecast),
            lstm_residual_forecast: round_record(residual_forecast),
            hybrid_forecast: round_record(arimax_forecast + residual_forecast),
            mape: mape.map(round_record),
            prediction_timestamp,
        }
    }
}

/// Multi-step forecast split into its linear and recurrent parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HybridForecast {
    /// ARIMAX forecast on the original scale.
    pub arimax: Vec<f64>,
    /// Residual correction, already inverse-scaled.
    pub residual: Vec<f64>,
    /// `arimax + residual`.
    pub hybrid: Vec<f64>,
}

impl HybridForecast {
    pub fn new(arimax: Vec<f64>, residual: Vec<f64>) -> Self {
        let hybrid = arimax.iter().zip(&residual).map(|(a, r)| a + r).collect();
        Self {
            arimax,
            residual,
            hybrid,
        }
    }

    pub fn horizon(&self) -> usize {
        self.hybrid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hybrid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn record_is_rounded() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let record = HybridPrediction::new(1.234567, 8.0, 1.11114, 0.22226, Some(3.456789), ts);
        assert_eq!(record.wave_height_in, 1.2346);
        assert_eq!(record.arimax_forecast, 1.1111);
        assert_eq!(record.lstm_residual_forecast, 0.2223);
        assert_eq!(record.hybrid_forecast, 1.3334);
        assert_eq!(record.mape, Some(3.4568));
    }

    #[test]
    fn record_serde_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let record = HybridPrediction::new(2.0, 5.5, 1.9, 0.05, None, ts);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"lstm_residual_forecast\":0.05"));
        let back: HybridPrediction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn forecast_sums_components() {
        let forecast = HybridForecast::new(vec![1.0, 2.0], vec![0.25, -0.5]);
        assert_eq!(forecast.horizon(), 2);
        assert_relative_eq!(forecast.hybrid[0], 1.25);
        assert_relative_eq!(forecast.hybrid[1], 1.5);
    }
}
