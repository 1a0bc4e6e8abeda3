//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - loads the dataset and model
//! - hands off to the web server, the TUI, or a one-shot command

use clap::Parser;
use tracing::{error, info};

use crate::cli::{Command, ForecastArgs, InputArgs, ServeArgs};
use crate::domain::Horizon;
use crate::error::{AppError, DashError};
use crate::logging::LogTarget;
use crate::models::Regressor;

pub mod pipeline;
pub mod resources;

use resources::Resources;

/// Entry point for the `evdash` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; variables may come from the environment.
    dotenvy::dotenv().ok();

    // `evdash` and `evdash --port 9000` behave like `evdash serve ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    crate::logging::init(log_target(&cli.command));

    let result = match cli.command {
        Command::Serve(args) => handle_serve(args),
        Command::Forecast(args) => handle_forecast(args),
        Command::Counties(args) => handle_counties(args),
        Command::Check(args) => handle_check(args),
        Command::Tui(args) => handle_tui(args),
    };

    if let Err(err) = &result {
        error!(exit_code = err.exit_code(), "{err}");
    }
    result
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    let config = args.to_config()?;
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| AppError::new(4, format!("Failed to start async runtime: {e}")))?;
    runtime.block_on(crate::web::serve(config))
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = args.input.to_config()?;
    let horizon = Horizon::new(args.horizon, config.max_horizon).map_err(DashError::from)?;

    let resources = Resources::new(config);
    let (dataset, model) = resources.preload()?;

    let county = match args.county {
        Some(county) => county.trim().to_string(),
        None => {
            let names: Vec<&str> = dataset.county_names().collect();
            crate::cli::picker::prompt_for_county(&names)?
        }
    };

    let run = pipeline::run_forecast(&dataset, &model, &county, horizon, resources.config().options)?;
    println!("{}", crate::report::format_forecast_report(&run));

    if args.plot {
        let history = dataset.history(&county).map_err(DashError::from)?;
        let plot = crate::plot::render_forecast_plot(history.records, &run.points, args.width, args.height);
        println!("{plot}");
    }

    Ok(())
}

fn handle_counties(args: InputArgs) -> Result<(), AppError> {
    let resources = Resources::new(args.to_config()?);
    let dataset = resources.dataset()?;

    let overview = crate::forecast::DatasetOverview::from_dataset(&dataset);
    println!("{}", crate::report::format_overview(&overview));
    println!("{}", crate::report::format_counties(&pipeline::county_summaries(&dataset)));
    Ok(())
}

fn handle_check(args: InputArgs) -> Result<(), AppError> {
    let resources = Resources::new(args.to_config()?);
    let (dataset, model) = resources.preload()?;
    let config = resources.config();

    info!(
        counties = dataset.county_count(),
        records = dataset.len(),
        "inputs ok"
    );

    let first = dataset.earliest_period();
    let last = dataset.latest_period();
    println!(
        "dataset: {} ({} records, {} counties, {first} to {last})",
        config.data_path.display(),
        dataset.len(),
        dataset.county_count()
    );
    println!("model:   {} ({})", config.model_path.display(), model.describe());
    let names: Vec<&str> = model.schema().features().iter().map(|f| f.name()).collect();
    println!("features: {}", names.join(", "));
    println!("horizon: 1..={} months (default {})", config.max_horizon, config.default_horizon);
    println!("guardrails: {}", if config.options.guardrails { "on" } else { "off" });
    Ok(())
}

fn handle_tui(args: InputArgs) -> Result<(), AppError> {
    crate::tui::run(args.to_config()?)
}

/// The TUI draws on the alternate screen, so it must not log to the terminal.
fn log_target(command: &Command) -> LogTarget {
    match command {
        Command::Tui(_) => LogTarget::Silent,
        _ => LogTarget::Stderr,
    }
}

/// Rewrite argv so `evdash` defaults to `evdash serve`.
///
/// Rules:
/// - `evdash`                          -> `evdash serve`
/// - `evdash --port 9000 ...`          -> `evdash serve --port 9000 ...`
/// - `evdash --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("serve".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "serve" | "forecast" | "counties" | "check" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "serve flags".
    if arg1.starts_with('-') {
        argv.insert(1, "serve".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_serves() {
        assert_eq!(rewrite_args(argv(&["evdash"])), argv(&["evdash", "serve"]));
    }

    #[test]
    fn leading_flag_goes_to_serve() {
        assert_eq!(
            rewrite_args(argv(&["evdash", "--port", "9000"])),
            argv(&["evdash", "serve", "--port", "9000"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            &["evdash", "forecast", "-c", "King"][..],
            &["evdash", "tui"][..],
            &["evdash", "--help"][..],
            &["evdash", "-V"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn tui_logs_nowhere() {
        let parse = |args: &[&str]| crate::cli::Cli::try_parse_from(rewrite_args(argv(args))).unwrap().command;
        assert_eq!(log_target(&parse(&["evdash", "tui"])), LogTarget::Silent);
        assert_eq!(log_target(&parse(&["evdash"])), LogTarget::Stderr);
        assert_eq!(log_target(&parse(&["evdash", "counties"])), LogTarget::Stderr);
    }

    #[test]
    fn rewritten_args_parse() {
        let cli = crate::cli::Cli::try_parse_from(rewrite_args(argv(&["evdash", "-p", "9000"]))).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 9000);
    }
}
