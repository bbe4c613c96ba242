//! GRU residual model.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ensure_finite, ForecastError, Result};
use crate::models::recurrent::cell::GruWeights;
use crate::models::recurrent::trainer::train_weights;
use crate::models::ResidualModel;
use crate::transform::create_sequences;
use crate::utils::CancellationToken;

/// Hyperparameters of [`GruResidualModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrentConfig {
    /// Input window length.
    pub window: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub hidden_size: usize,
    pub momentum: f64,
    /// Global gradient-norm cap.
    pub clip_norm: f64,
    /// Multiplicative learning-rate decay applied every `decay_every` epochs.
    pub lr_decay: f64,
    pub decay_every: usize,
    /// Stop after this many epochs without improvement.
    pub patience: Option<usize>,
    /// Seed for initialization and shuffling.
    pub seed: u64,
}

impl Default for RecurrentConfig {
    fn default() -> Self {
        Self {
            window: 12,
            epochs: 10,
            learning_rate: 0.01,
            hidden_size: 8,
            momentum: 0.9,
            clip_norm: 1.0,
            lr_decay: 0.97,
            decay_every: 7,
            patience: None,
            seed: 42,
        }
    }
}

impl RecurrentConfig {
    /// Defaults with the three primary hyperparameters set.
    pub fn new(window: usize, epochs: usize, learning_rate: f64) -> Self {
        Self {
            window,
            epochs,
            learning_rate,
            ..Self::default()
        }
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = Some(patience);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject hyperparameters that cannot train.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ForecastError::InvalidHyperparameter(msg));

        if self.window == 0 {
            return invalid("window must be positive".into());
        }
        if self.epochs == 0 {
            return invalid("epochs must be positive".into());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid(format!("learning_rate={} must be positive", self.learning_rate));
        }
        if self.hidden_size == 0 {
            return invalid("hidden_size must be positive".into());
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return invalid(format!("momentum={} must be in [0, 1)", self.momentum));
        }
        if !self.clip_norm.is_finite() || self.clip_norm <= 0.0 {
            return invalid(format!("clip_norm={} must be positive", self.clip_norm));
        }
        if !(self.lr_decay > 0.0 && self.lr_decay <= 1.0) {
            return invalid(format!("lr_decay={} must be in (0, 1]", self.lr_decay));
        }
        if self.decay_every == 0 {
            return invalid("decay_every must be positive".into());
        }
        if self.patience == Some(0) {
            return invalid("patience must be positive".into());
        }
        Ok(())
    }
}

/// Loss curve of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Mean squared error per epoch.
    pub losses: Vec<f64>,
    pub final_loss: f64,
    pub best_loss: f64,
    pub epochs_trained: usize,
    pub stopped_early: bool,
}

/// Snapshot of a trained [`GruResidualModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GruParameters {
    pub config: RecurrentConfig,
    pub weights: GruWeights,
    pub history: TrainingHistory,
}

/// GRU that predicts the next standardized residual from a sliding window.
///
/// # Example
///
/// ```
/// use seawave_forecast::models::recurrent::{GruResidualModel, RecurrentConfig};
/// use seawave_forecast::models::ResidualModel;
/// use seawave_forecast::utils::CancellationToken;
///
/// let residuals: Vec<f64> = (0..40).map(|i| (i as f64 * 0.4).sin()).collect();
/// let mut model = GruResidualModel::new(RecurrentConfig::new(6, 3, 0.01));
/// let history = model.train(&residuals, &CancellationToken::new()).unwrap();
/// assert_eq!(history.losses.len(), 3);
///
/// let next = model.predict(&residuals[residuals.len() - 6..]).unwrap();
/// assert!(next.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct GruResidualModel {
    config: RecurrentConfig,
    weights: Option<GruWeights>,
    history: Option<TrainingHistory>,
}

impl Default for GruResidualModel {
    fn default() -> Self {
        Self::new(RecurrentConfig::default())
    }
}

impl GruResidualModel {
    pub fn new(config: RecurrentConfig) -> Self {
        Self {
            config,
            weights: None,
            history: None,
        }
    }

    pub fn config(&self) -> &RecurrentConfig {
        &self.config
    }

    /// Loss history of the last successful training run.
    pub fn history(&self) -> Option<&TrainingHistory> {
        self.history.as_ref()
    }

    fn fitted_weights(&self) -> Result<&GruWeights> {
        self.weights
            .as_ref()
            .ok_or(ForecastError::NotFitted("recurrent model"))
    }
}

impl ResidualModel for GruResidualModel {
    type Parameters = GruParameters;

    fn train(&mut self, residuals: &[f64], cancel: &CancellationToken) -> Result<TrainingHistory> {
        self.config.validate()?;
        ensure_finite(residuals)?;
        let sequences = create_sequences(residuals, self.config.window)?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let initial = GruWeights::xavier(self.config.hidden_size, &mut rng);
        let (weights, history) = train_weights(initial, &sequences, &self.config, &mut rng, cancel)?;

        info!(
            samples = sequences.len(),
            epochs = history.epochs_trained,
            final_loss = history.final_loss,
            "recurrent model trained"
        );
        self.weights = Some(weights);
        self.history = Some(history.clone());
        Ok(history)
    }

    fn predict(&self, last_window: &[f64]) -> Result<f64> {
        let weights = self.fitted_weights()?;
        if last_window.len() != self.config.window {
            return Err(ForecastError::WindowSizeMismatch {
                expected: self.config.window,
                got: last_window.len(),
            });
        }
        ensure_finite(last_window)?;
        Ok(weights.forward(last_window))
    }

    fn get_parameters(&self) -> Result<GruParameters> {
        let weights = self.fitted_weights()?;
        let history = self
            .history
            .clone()
            .ok_or(ForecastError::NotFitted("recurrent model"))?;
        Ok(GruParameters {
            config: self.config.clone(),
            weights: weights.clone(),
            history,
        })
    }

    fn window(&self) -> usize {
        self.config.window
    }

    fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }

    fn name(&self) -> &str {
        "GRU"
    }
}
