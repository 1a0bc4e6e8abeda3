//! Forecasting model: input features and the estimators that consume them.

pub mod estimator;
pub mod features;

pub use estimator::*;
pub use features::*;
