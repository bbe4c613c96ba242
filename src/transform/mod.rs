//! Data transformations feeding the models.
//!
//! Provides z-score scaling with explicit parameters and sliding windows for
//! the recurrent residual model.
//!
//! # Example
//!
//! ```
//! use seawave_forecast::transform::{create_sequences, Scaler, StandardScaler};
//!
//! let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
//!
//! let scaler = StandardScaler::new();
//! let (scaled, params) = scaler.fit_transform_standard(&series).unwrap();
//! let restored = scaler.inverse_transform_standard(&scaled, &params);
//! assert!((restored[4] - 5.0).abs() < 1e-12);
//!
//! let seq = create_sequences(&scaled, 3).unwrap();
//! assert_eq!(seq.len(), 2);
//! ```

pub mod scale;
pub mod window;

pub use scale::{ScalerDescription, ScalerParams, Scaler, StandardScaler, MIN_STD_THRESHOLD};
pub use window::{create_sequences, last_window, Sequences};
