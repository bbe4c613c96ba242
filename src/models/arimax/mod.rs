//! ARIMAX models: differencing, estimation, recursive forecasting and order
//! selection.

pub mod diff;
mod hannan_rissanen;
mod model;
pub mod selection;

pub use diff::{difference, difference_continuing, suggest_differencing, DifferenceState};
pub use hannan_rissanen::HannanRissanenArimax;
pub use model::{
    forecast, forecast_fit, ArimaxFit, ArimaxOrder, ForecastBuffer, OlsArimax, MAX_DIFFERENCING,
};
pub use selection::{select_order, CandidateEvaluation, OrderSearch, OrderSelection, Rejection};
