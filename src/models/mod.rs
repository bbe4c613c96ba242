//! Forecasting models.

mod traits;

pub mod arimax;
pub mod recurrent;

pub use arimax::{ArimaxFit, ArimaxOrder, HannanRissanenArimax, OlsArimax};
pub use recurrent::{GruResidualModel, RecurrentConfig, TrainingHistory};
pub use traits::{ArimaxEstimator, ResidualModel};
