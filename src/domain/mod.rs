//! Domain types used throughout the dashboard.
//!
//! This module defines:
//!
//! - calendar-month period keys (`Period`)
//! - historical records and per-county views (`HistoricalRecord`, `CountyHistory`)
//! - forecast outputs and request bounds (`ForecastPoint`, `Horizon`)
//! - resolved runtime configuration (`DashConfig`)

pub mod period;
pub mod types;

pub use period::*;
pub use types::*;
