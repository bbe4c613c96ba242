//! Hybrid ARIMAX + recurrent residual forecasting session.

use std::ops::Range;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{split_observations, HybridForecast, HybridPrediction, Observation, SeriesSplit};
use crate::error::{ForecastError, Result};
use crate::hybrid::config::HybridConfig;
use crate::hybrid::report::{EvaluationReport, FitReport, SplitScore};
use crate::models::{
    ArimaxEstimator, ArimaxFit, GruResidualModel, OlsArimax, ResidualModel, TrainingHistory,
};
use crate::transform::{last_window, Scaler, ScalerParams, StandardScaler};
use crate::utils::{absolute_percentage_error, calculate_metrics, mape, CancellationToken};
use crate::validation::{ljung_box, stationarity_report};

/// Pipeline stage a session has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Unfit,
    ScalerFit,
    ArimaxFit,
    ResidualsComputed,
    RecurrentFit,
    Ready,
    Forecasted,
}

impl SessionState {
    /// Whether forecasts can be served.
    pub fn is_ready(self) -> bool {
        matches!(self, SessionState::Ready | SessionState::Forecasted)
    }

    fn is_trained(self) -> bool {
        matches!(self, SessionState::RecurrentFit) || self.is_ready()
    }
}

/// Hybrid forecaster: a linear ARIMAX model on wave height with wind speed
/// as regressor, corrected by a recurrent model of its standardized
/// residuals.
///
/// The pipeline runs in fixed order. Each step method checks that the
/// previous one has completed and returns [`ForecastError::NotFitted`]
/// otherwise; [`fit`](Self::fit) runs all of them.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use seawave_forecast::prelude::*;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let observations: Vec<Observation> = (0..80)
///     .map(|i| {
///         let wind = 4.0 + (i as f64 * 0.7).sin() * 2.0;
///         let height = 1.0 + 0.01 * i as f64 + 0.3 * wind + 0.05 * (i as f64 * 1.3).cos();
///         Observation::new(start + Duration::hours(i), height, wind).unwrap()
///     })
///     .collect();
///
/// let config = HybridConfig::default()
///     .with_recurrent(RecurrentConfig::new(6, 3, 0.01));
/// let mut session = HybridForecaster::new(config).unwrap();
/// session.fit(&observations).unwrap();
///
/// let forecast = session.forecast(&[4.5, 5.0]).unwrap();
/// assert_eq!(forecast.horizon(), 2);
/// ```
#[derive(Debug)]
pub struct HybridForecaster<A = OlsArimax, R = GruResidualModel, S = StandardScaler> {
    config: HybridConfig,
    estimator: A,
    residual_model: R,
    scaler: S,
    cancel: CancellationToken,
    state: SessionState,
    split: Option<SeriesSplit>,
    input_scalers: Option<(ScalerParams, ScalerParams)>,
    y_train: Vec<f64>,
    x_train: Vec<f64>,
    arimax: Option<ArimaxFit>,
    residuals: Vec<f64>,
    residual_scaler: Option<ScalerParams>,
    history: Option<TrainingHistory>,
    residual_window: Vec<f64>,
}

impl HybridForecaster {
    /// OLS ARIMAX with a GRU residual model, both configured from `config`.
    pub fn new(config: HybridConfig) -> Result<Self> {
        let residual_model = GruResidualModel::new(config.recurrent.clone());
        let scaler = StandardScaler::new().with_threshold(config.scaler_threshold);
        Self::with_models(config, OlsArimax, residual_model, scaler)
    }
}

impl<A: ArimaxEstimator, R: ResidualModel, S: Scaler> HybridForecaster<A, R, S> {
    /// Session over caller-supplied components.
    ///
    /// The residual model trains with its own configuration; its window
    /// must equal `config.recurrent.window`.
    pub fn with_models(config: HybridConfig, estimator: A, residual_model: R, scaler: S) -> Result<Self> {
        config.validate()?;
        if residual_model.window() != config.recurrent.window {
            return Err(ForecastError::InvalidHyperparameter(format!(
                "residual model window {} does not match configured window {}",
                residual_model.window(),
                config.recurrent.window
            )));
        }
        Ok(Self {
            config,
            estimator,
            residual_model,
            scaler,
            cancel: CancellationToken::new(),
            state: SessionState::Unfit,
            split: None,
            input_scalers: None,
            y_train: Vec::new(),
            x_train: Vec::new(),
            arimax: None,
            residuals: Vec::new(),
            residual_scaler: None,
            history: None,
            residual_window: Vec::new(),
        })
    }

    /// Token checked during recurrent training.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    pub fn split(&self) -> Option<&SeriesSplit> {
        self.split.as_ref()
    }

    pub fn arimax_fit(&self) -> Option<&ArimaxFit> {
        self.arimax.as_ref()
    }

    /// Training residuals on the original scale, from the ARIMAX fit start.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn residual_model(&self) -> &R {
        &self.residual_model
    }

    fn require(&self, expected: SessionState, missing: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ForecastError::NotFitted(missing))
        }
    }

    fn require_ready(&self) -> Result<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(ForecastError::NotFitted("hybrid session"))
        }
    }

    fn fitted_arimax(&self) -> Result<&ArimaxFit> {
        self.arimax
            .as_ref()
            .ok_or(ForecastError::NotFitted("ARIMAX model"))
    }

    fn reset(&mut self) {
        self.state = SessionState::Unfit;
        self.split = None;
        self.input_scalers = None;
        self.y_train.clear();
        self.x_train.clear();
        self.arimax = None;
        self.residuals.clear();
        self.residual_scaler = None;
        self.history = None;
        self.residual_window.clear();
    }

    /// Split `observations` chronologically and fit the scaler on the
    /// training wave heights and wind speeds.
    ///
    /// Valid in any state; later stages are discarded.
    pub fn fit_scaler(&mut self, observations: &[Observation]) -> Result<()> {
        let mut split = split_observations(observations, &self.config.split)?;
        let params = split.normalize_training(&self.scaler)?;

        self.reset();
        self.y_train = split.training_wave_heights();
        self.x_train = split.training_wind_speeds();
        info!(
            train = split.training.len(),
            validation = split.validation.len(),
            test = split.test.len(),
            "scaler fitted on training split"
        );
        self.split = Some(split);
        self.input_scalers = Some(params);
        self.state = SessionState::ScalerFit;
        Ok(())
    }

    /// Fit ARIMAX on the original-scale training series.
    pub fn fit_arimax(&mut self) -> Result<()> {
        self.require(SessionState::ScalerFit, "scaler")?;
        let order = self.config.arimax;
        let fit = self.estimator.train(&self.y_train, &self.x_train, order)?;
        info!(
            estimator = self.estimator.name(),
            %order,
            aic = fit.aic(),
            "ARIMAX fitted"
        );
        self.arimax = Some(fit);
        self.state = SessionState::ArimaxFit;
        Ok(())
    }

    /// Training residuals `actual - fitted` from the ARIMAX fit start.
    pub fn compute_residuals(&mut self) -> Result<()> {
        self.require(SessionState::ArimaxFit, "ARIMAX model")?;
        let fit = self.fitted_arimax()?;
        let start = fit.fit_start();
        let residuals: Vec<f64> = self.y_train[start..]
            .iter()
            .zip(&fit.fitted()[start..])
            .map(|(actual, fitted)| actual - fitted)
            .collect();

        debug!(count = residuals.len(), start, "residuals computed");
        self.residuals = residuals;
        self.state = SessionState::ResidualsComputed;
        Ok(())
    }

    /// Standardize the residuals and train the residual model on them.
    ///
    /// On failure, cancellation included, the session stays in
    /// [`SessionState::ResidualsComputed`] and the step can be retried.
    pub fn fit_recurrent(&mut self) -> Result<()> {
        self.require(SessionState::ResidualsComputed, "residual series")?;
        let (scaled, params) = self.scaler.fit_transform_standard(&self.residuals)?;
        let history = self.residual_model.train(&scaled, &self.cancel)?;

        self.residual_window = last_window(&scaled, self.residual_model.window())?.to_vec();
        self.residual_scaler = Some(params);
        self.history = Some(history);
        self.state = SessionState::RecurrentFit;
        Ok(())
    }

    /// Final check before serving forecasts.
    pub fn prepare_forecast(&mut self) -> Result<()> {
        self.require(SessionState::RecurrentFit, "recurrent model")?;
        if self.residual_window.len() != self.residual_model.window() {
            return Err(ForecastError::WindowSizeMismatch {
                expected: self.residual_model.window(),
                got: self.residual_window.len(),
            });
        }
        info!(model = self.residual_model.name(), "hybrid session ready");
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Run every step from a fresh split of `observations`.
    pub fn fit(&mut self, observations: &[Observation]) -> Result<()> {
        self.fit_scaler(observations)?;
        self.fit_arimax()?;
        self.compute_residuals()?;
        self.fit_recurrent()?;
        self.prepare_forecast()
    }

    /// Forecast one step per entry of `x_future`, continuing from the end
    /// of the training split.
    pub fn forecast(&mut self, x_future: &[f64]) -> Result<HybridForecast> {
        self.require_ready()?;
        if x_future.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let fit = self.fitted_arimax()?;
        let arimax = self
            .estimator
            .forecast(fit, &self.y_train, &self.x_train, x_future)?;

        let params = self
            .residual_scaler
            .ok_or(ForecastError::NotFitted("residual scaler"))?;
        let scaled = self
            .residual_model
            .predict_multiple(&self.residual_window, x_future.len())?;
        let residual = self.scaler.inverse_transform_standard(&scaled, &params);

        debug!(horizon = x_future.len(), "hybrid forecast");
        self.state = SessionState::Forecasted;
        Ok(HybridForecast::new(arimax, residual))
    }

    /// One-step forecast for `wind_speed`, scored against `wave_height`.
    pub fn predict(&mut self, wave_height: f64, wind_speed: f64) -> Result<HybridPrediction> {
        let observation = Observation::new(Utc::now(), wave_height, wind_speed)?;
        self.predict_observation(&observation)
    }

    /// Like [`predict`](Self::predict), stamped with the observation's time.
    pub fn predict_observation(&mut self, observation: &Observation) -> Result<HybridPrediction> {
        let forecast = self.forecast(&[observation.wind_speed()])?;
        Ok(HybridPrediction::new(
            observation.wave_height(),
            observation.wind_speed(),
            forecast.arimax[0],
            forecast.residual[0],
            absolute_percentage_error(observation.wave_height(), forecast.hybrid[0]),
            observation.timestamp(),
        ))
    }

    /// Forecast across the validation and test splits with their recorded
    /// wind speeds and score both against the actual wave heights.
    pub fn evaluate(&mut self) -> Result<EvaluationReport> {
        self.require_ready()?;
        let split = self
            .split
            .as_ref()
            .ok_or(ForecastError::NotFitted("series split"))?;
        let n_validation = split.validation.len();
        let holdout: Vec<Observation> = split.holdout().copied().collect();
        if holdout.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }

        let winds: Vec<f64> = holdout.iter().map(|o| o.wind_speed()).collect();
        let actual: Vec<f64> = holdout.iter().map(|o| o.wave_height()).collect();
        let forecast = self.forecast(&winds)?;

        let score = |range: Range<usize>| -> Result<SplitScore> {
            if range.is_empty() {
                return Ok(SplitScore {
                    rows: 0,
                    arimax_mape: None,
                    hybrid_mape: None,
                });
            }
            Ok(SplitScore {
                rows: range.len(),
                arimax_mape: mape(&actual[range.clone()], &forecast.arimax[range.clone()])?,
                hybrid_mape: mape(&actual[range.clone()], &forecast.hybrid[range])?,
            })
        };
        let validation = score(0..n_validation)?;
        let test = score(n_validation..holdout.len())?;

        let test_metrics = if test.rows > 0 {
            Some(calculate_metrics(
                &actual[n_validation..],
                &forecast.hybrid[n_validation..],
            )?)
        } else {
            None
        };

        let records = holdout
            .iter()
            .enumerate()
            .skip(n_validation)
            .map(|(i, obs)| {
                HybridPrediction::new(
                    obs.wave_height(),
                    obs.wind_speed(),
                    forecast.arimax[i],
                    forecast.residual[i],
                    absolute_percentage_error(obs.wave_height(), forecast.hybrid[i]),
                    obs.timestamp(),
                )
            })
            .collect();

        info!(
            validation_mape = ?validation.hybrid_mape,
            test_mape = ?test.hybrid_mape,
            test_arimax_mape = ?test.arimax_mape,
            "holdout evaluated"
        );
        Ok(EvaluationReport {
            validation,
            test,
            test_metrics,
            records,
        })
    }

    /// Coefficients, diagnostics and training history of the fitted session.
    pub fn fit_report(&self) -> Result<FitReport> {
        if !self.state.is_trained() {
            return Err(ForecastError::NotFitted("hybrid session"));
        }
        let fit = self.fitted_arimax()?;
        let (wave_height_scaler, wind_speed_scaler) = self
            .input_scalers
            .ok_or(ForecastError::NotFitted("scaler"))?;
        let residual_params = self
            .residual_scaler
            .ok_or(ForecastError::NotFitted("residual scaler"))?;
        let training = self
            .history
            .clone()
            .ok_or(ForecastError::NotFitted("recurrent model"))?;
        let order = fit.order();

        Ok(FitReport {
            estimator: self.estimator.name().to_string(),
            order,
            intercept: fit.intercept(),
            phi: fit.phi().to_vec(),
            theta: fit.theta().to_vec(),
            beta_x: fit.beta_x(),
            std_errors: fit.std_errors().to_vec(),
            sigma2: fit.sigma2(),
            aic: fit.aic(),
            bic: fit.bic(),
            normality: fit.normality().clone(),
            ljung_box: ljung_box(fit.residuals(), None, order.p + order.q),
            wave_height_scaler,
            wind_speed_scaler,
            residual_scaler: self.scaler.describe(&residual_params),
            training,
            stationarity: stationarity_report(&self.y_train, self.config.diagnostic_lags),
        })
    }
}
