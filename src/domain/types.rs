//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - held read-only in memory for the process lifetime (records)
//! - produced per request (forecasts)
//! - returned as JSON by the web API

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::Period;
use crate::error::SelectionError;

/// Default dataset location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "preprocessed_ev_data.csv";

/// Default model artifact location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "forecasting_ev_model.json";

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_MAX_HORIZON: u32 = 12;
pub const DEFAULT_HORIZON: u32 = 6;

/// State label used when the dataset has no `State` column.
pub const UNKNOWN_STATE: &str = "Unknown";

/// One row of the historical dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub county: String,
    pub state: String,
    pub period: Period,
    pub ev_total: u64,
    /// Share of registered vehicles that are electric, in percent.
    pub ev_percent: f64,
    pub bev_count: u64,
    pub phev_count: u64,
}

/// A single predicted value for a future month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: Period,
    pub predicted_value: f64,
}

/// Borrowed view of one county's records, sorted by period ascending.
#[derive(Debug, Clone, Copy)]
pub struct CountyHistory<'a> {
    pub county: &'a str,
    pub state: &'a str,
    /// Label encoding fed to the model as `county_encoded`.
    pub encoding: i64,
    pub records: &'a [HistoricalRecord],
}

impl<'a> CountyHistory<'a> {
    pub fn first_period(&self) -> Option<Period> {
        self.records.first().map(|r| r.period)
    }

    pub fn last_period(&self) -> Option<Period> {
        self.records.last().map(|r| r.period)
    }

    pub fn latest(&self) -> Option<&'a HistoricalRecord> {
        self.records.last()
    }

    /// EV totals in chronological order.
    pub fn ev_totals(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.ev_total as f64).collect()
    }

    /// `County, State`, or just the county when the state is unknown.
    pub fn display_name(&self) -> String {
        if self.state.is_empty() || self.state == UNKNOWN_STATE {
            self.county.to_string()
        } else {
            format!("{}, {}", self.county, self.state)
        }
    }
}

/// A validated forecast horizon (`1..=max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Horizon(u32);

impl Horizon {
    pub fn new(months: i64, max: u32) -> Result<Self, SelectionError> {
        if months < 1 || months > i64::from(max) {
            return Err(SelectionError::HorizonOutOfRange { horizon: months, max });
        }
        Ok(Self(months as u32))
    }

    /// Parse raw UI input (query string, text box).
    pub fn parse(raw: &str, max: u32) -> Result<Self, SelectionError> {
        let trimmed = raw.trim();
        let months = trimmed
            .parse::<i64>()
            .map_err(|_| SelectionError::HorizonNotANumber(trimmed.to_string()))?;
        Self::new(months, max)
    }

    pub fn months(self) -> u32 {
        self.0
    }
}

/// Post-processing applied to raw model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastOptions {
    /// Clamp implausible month-over-month jumps and enforce a minimum growth
    /// trend after the first step.
    pub guardrails: bool,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self { guardrails: true }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub max_horizon: u32,
    pub default_horizon: u32,
    pub options: ForecastOptions,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            max_horizon: DEFAULT_MAX_HORIZON,
            default_horizon: DEFAULT_HORIZON,
            options: ForecastOptions::default(),
        }
    }
}
