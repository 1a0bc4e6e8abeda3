//! Forecast generation and the metrics derived from it.

pub mod generator;
pub mod metrics;

pub use generator::*;
pub use metrics::*;
