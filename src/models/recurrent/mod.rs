//! Recurrent residual correction.
//!
//! A small GRU learns the structure left in the standardized ARIMAX
//! residuals and predicts the next residual from a sliding window.

mod cell;
mod model;
mod trainer;

pub use cell::GruWeights;
pub use model::{GruParameters, GruResidualModel, RecurrentConfig, TrainingHistory};
