//! Observations, chronological splits and prediction records.

mod observation;
mod prediction;
mod split;

pub use observation::{Observation, TrainingRow};
pub use prediction::{HybridForecast, HybridPrediction, RECORD_DECIMALS};
pub use split::{split_observations, SeriesSplit, SplitConfig};
