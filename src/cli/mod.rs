//! Command-line parsing for the EV adoption dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from loading and forecasting code.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_DATA_PATH, DEFAULT_HORIZON, DEFAULT_MAX_HORIZON, DEFAULT_MODEL_PATH, DEFAULT_PORT, DashConfig,
    ForecastOptions,
};
use crate::error::AppError;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "evdash", version, about = "County-level EV adoption forecasting dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the web dashboard (the default when no subcommand is given).
    Serve(ServeArgs),
    /// Forecast one county and print the metrics table.
    Forecast(ForecastArgs),
    /// List counties with their latest figures.
    Counties(InputArgs),
    /// Load the dataset and model, report what was found, and exit.
    Check(InputArgs),
    /// Launch the interactive terminal dashboard.
    Tui(InputArgs),
}

/// Where the inputs live and how forecasts are post-processed.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Preprocessed county dataset (CSV).
    #[arg(long, value_name = "CSV", env = "EVDASH_DATA", default_value = DEFAULT_DATA_PATH)]
    pub data: PathBuf,

    /// Trained model artifact (JSON).
    #[arg(long, value_name = "JSON", env = "EVDASH_MODEL", default_value = DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Largest horizon (months) a user may request.
    #[arg(long, env = "EVDASH_MAX_HORIZON", default_value_t = DEFAULT_MAX_HORIZON)]
    pub max_horizon: u32,

    /// Pass raw model output through without clamping.
    #[arg(long)]
    pub no_guardrails: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "EVDASH_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short = 'p', long, env = "EVDASH_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// County to forecast. Prompts with a list when omitted.
    #[arg(short = 'c', long)]
    pub county: Option<String>,

    /// Months to forecast.
    #[arg(short = 'm', long = "horizon", default_value_t = i64::from(DEFAULT_HORIZON), allow_negative_numbers = true)]
    pub horizon: i64,

    /// Render an ASCII chart of history plus forecast.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    #[command(flatten)]
    pub input: InputArgs,
}

impl InputArgs {
    /// Resolve into a validated config. Server fields keep their defaults.
    pub fn to_config(&self) -> Result<DashConfig, AppError> {
        if self.max_horizon == 0 {
            return Err(AppError::new(2, "--max-horizon must be at least 1"));
        }
        Ok(DashConfig {
            data_path: self.data.clone(),
            model_path: self.model.clone(),
            max_horizon: self.max_horizon,
            default_horizon: DEFAULT_HORIZON.min(self.max_horizon),
            options: ForecastOptions {
                guardrails: !self.no_guardrails,
            },
            ..DashConfig::default()
        })
    }
}

impl ServeArgs {
    pub fn to_config(&self) -> Result<DashConfig, AppError> {
        Ok(DashConfig {
            host: self.host,
            port: self.port,
            ..self.input.to_config()?
        })
    }
}
