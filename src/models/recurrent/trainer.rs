//! Per-sample SGD with momentum for [`GruWeights`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::recurrent::cell::GruWeights;
use crate::models::recurrent::model::{RecurrentConfig, TrainingHistory};
use crate::transform::Sequences;
use crate::utils::CancellationToken;

/// Smallest loss decrease that resets the early-stopping counter.
const MIN_IMPROVEMENT: f64 = 1e-12;

/// Learning rate for `epoch` under step decay.
pub(crate) fn learning_rate_at(config: &RecurrentConfig, epoch: usize) -> f64 {
    let steps = epoch / config.decay_every.max(1);
    config.learning_rate * config.lr_decay.powi(steps as i32)
}

/// Train `weights` on `sequences` and return the final weights with the
/// loss history.
///
/// `weights` is consumed so a failed or cancelled run never leaks partial
/// updates into the caller's model.
pub(crate) fn train_weights(
    mut weights: GruWeights,
    sequences: &Sequences,
    config: &RecurrentConfig,
    rng: &mut StdRng,
    cancel: &CancellationToken,
) -> Result<(GruWeights, TrainingHistory)> {
    let n = sequences.len();
    let mut velocity = GruWeights::zeros(weights.hidden_size);
    let mut order: Vec<usize> = (0..n).collect();

    let mut losses = Vec::with_capacity(config.epochs);
    let mut best_loss = f64::INFINITY;
    let mut since_best = 0;
    let mut stopped_early = false;

    for epoch in 0..config.epochs {
        let lr = learning_rate_at(config, epoch);
        order.shuffle(rng);

        let mut total = 0.0;
        for &idx in &order {
            cancel.check()?;

            let (prediction, caches) = weights.forward_with_cache(&sequences.inputs[idx]);
            let error = prediction - sequences.targets[idx];
            total += error * error;

            let mut grad = weights.backward(&caches, 2.0 * error);
            let norm = grad.norm();
            if norm > config.clip_norm {
                grad.scale(config.clip_norm / norm);
            }

            velocity.zip_apply(&grad, |v, g| *v = config.momentum * *v - lr * g);
            weights.zip_apply(&velocity, |w, v| *w += v);
        }

        let loss = total / n as f64;
        if !loss.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "training diverged at epoch {epoch}"
            )));
        }
        losses.push(loss);
        debug!(epoch, loss, lr, "recurrent epoch");

        let improved = best_loss - loss > MIN_IMPROVEMENT;
        best_loss = best_loss.min(loss);
        if improved {
            since_best = 0;
        } else {
            since_best += 1;
            if config.patience.is_some_and(|p| since_best >= p) {
                debug!(epoch, best_loss, "early stopping");
                stopped_early = true;
                break;
            }
        }
    }

    let history = TrainingHistory {
        final_loss: losses.last().copied().unwrap_or(f64::NAN),
        best_loss,
        epochs_trained: losses.len(),
        stopped_early,
        losses,
    };
    Ok((weights, history))
}
