//! Shared "selection -> forecast -> view" logic used by the CLI, TUI and web
//! front ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate selection -> slice history -> forecast -> metrics
//!
//! The front ends can then focus on presentation (printing, widgets, HTML).
//! Everything is derived from scratch on each call; nothing here keeps state.

use serde::Serialize;

use crate::app::resources::Resources;
use crate::domain::{CountyHistory, ForecastOptions, ForecastPoint, HistoricalRecord, Horizon};
use crate::error::{DashError, SelectionError};
use crate::forecast::{CountySummary, DatasetOverview, ForecastMetrics, generate_forecast};
use crate::io::Dataset;
use crate::models::{ForecastModel, Regressor};

/// All computed outputs of one forecast request.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastRun {
    pub summary: CountySummary,
    pub horizon: u32,
    pub model: String,
    pub points: Vec<ForecastPoint>,
    pub metrics: ForecastMetrics,
}

/// Check a raw `(county, horizon)` selection against the loaded dataset.
pub fn validate_selection(
    dataset: &Dataset,
    county: Option<&str>,
    horizon: &str,
    max_horizon: u32,
) -> Result<(String, Horizon), SelectionError> {
    let county = county
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(SelectionError::MissingCounty)?;
    if !dataset.contains(county) {
        return Err(SelectionError::UnknownCounty(county.to_string()));
    }
    let horizon = Horizon::parse(horizon, max_horizon)?;
    Ok((county.to_string(), horizon))
}

/// Forecast one county from an already validated selection.
pub fn run_forecast(
    dataset: &Dataset,
    model: &ForecastModel,
    county: &str,
    horizon: Horizon,
    options: ForecastOptions,
) -> Result<ForecastRun, DashError> {
    let history = dataset.history(county)?;
    let summary = CountySummary::from_history(&history)
        .ok_or_else(|| DashError::Inference(format!("no history for county '{county}'")))?;

    let points = generate_forecast(model, &history, dataset.earliest_period(), horizon, options)?;
    let metrics = ForecastMetrics::compute(summary.latest_ev_total as f64, &points)
        .ok_or_else(|| DashError::Inference("forecast produced no points".to_string()))?;

    tracing::info!(
        county,
        horizon = horizon.months(),
        growth_pct = metrics.growth_pct,
        outlook = ?metrics.outlook,
        "forecast ready"
    );

    Ok(ForecastRun {
        summary,
        horizon: horizon.months(),
        model: model.describe(),
        points,
        metrics,
    })
}

/// What kind of problem a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    InvalidSelection,
    Inference,
}

/// A recoverable problem shown inline instead of a forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn from_error(err: &DashError) -> Option<Self> {
        let kind = match err {
            DashError::InvalidSelection(_) => NoticeKind::InvalidSelection,
            DashError::Inference(_) => NoticeKind::Inference,
            _ => return None,
        };
        Some(Self {
            kind,
            message: err.to_string(),
        })
    }
}

/// One entry of the county picker: the key to submit and the label to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyChoice {
    pub name: String,
    pub label: String,
}

/// Everything a dashboard page needs for one interaction.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub counties: Vec<CountyChoice>,
    pub selected: Option<String>,
    /// Horizon echoed back into the input control.
    pub horizon: u32,
    pub max_horizon: u32,
    pub overview: DatasetOverview,
    pub summary: Option<CountySummary>,
    pub history: Vec<HistoricalRecord>,
    pub forecast: Option<ForecastRun>,
    pub notice: Option<Notice>,
}

/// Raw selection as it arrives from a form or query string.
#[derive(Debug, Clone, Default)]
pub struct RawSelection {
    pub county: Option<String>,
    pub horizon: Option<String>,
}

/// Derive a full dashboard view from a raw selection.
///
/// Load failures are returned as errors. Selection and inference problems are
/// reported through `DashboardView::notice`.
pub fn build_dashboard(resources: &Resources, raw: &RawSelection) -> Result<DashboardView, DashError> {
    let dataset = resources.dataset()?;
    let model = resources.model()?;
    let config = resources.config();

    let counties: Vec<CountyChoice> = dataset
        .histories()
        .map(|h| CountyChoice {
            name: h.county.to_string(),
            label: h.display_name(),
        })
        .collect();
    let selected = raw
        .county
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let mut view = DashboardView {
        counties,
        selected: selected.clone(),
        horizon: raw
            .horizon
            .as_deref()
            .and_then(|h| Horizon::parse(h, config.max_horizon).ok())
            .map_or(config.default_horizon, Horizon::months),
        max_horizon: config.max_horizon,
        overview: DatasetOverview::from_dataset(&dataset),
        summary: None,
        history: Vec::new(),
        forecast: None,
        notice: None,
    };

    // No county chosen yet: overview only.
    let Some(county) = selected else {
        return Ok(view);
    };

    if let Ok(history) = dataset.history(&county) {
        view.summary = CountySummary::from_history(&history);
        view.history = history.records.to_vec();
    }

    let default_horizon = config.default_horizon.to_string();
    let horizon_raw = raw.horizon.as_deref().unwrap_or(&default_horizon);

    let outcome = validate_selection(&dataset, Some(&county), horizon_raw, config.max_horizon)
        .map_err(DashError::from)
        .and_then(|(county, horizon)| run_forecast(&dataset, &model, &county, horizon, config.options));

    match outcome {
        Ok(run) => view.forecast = Some(run),
        Err(err) => match Notice::from_error(&err) {
            Some(notice) => {
                tracing::warn!(%err, "selection not forecast");
                view.notice = Some(notice);
            }
            None => return Err(err),
        },
    }

    Ok(view)
}

/// County summaries for every county, alphabetical.
pub fn county_summaries(dataset: &Dataset) -> Vec<CountySummary> {
    dataset
        .histories()
        .filter_map(|h: CountyHistory<'_>| CountySummary::from_history(&h))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DashConfig, Period};
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    fn resources() -> Resources {
        Resources::new(DashConfig {
            data_path: fixture("ev_sample.csv"),
            model_path: fixture("forest_model.json"),
            ..DashConfig::default()
        })
    }

    fn select(county: Option<&str>, horizon: Option<&str>) -> RawSelection {
        RawSelection {
            county: county.map(str::to_string),
            horizon: horizon.map(str::to_string),
        }
    }

    #[test]
    fn king_forecast_for_three_months() {
        let view = build_dashboard(&resources(), &select(Some("King"), Some("3"))).unwrap();
        assert!(view.notice.is_none(), "{:?}", view.notice);

        let run = view.forecast.unwrap();
        let periods: Vec<Period> = run.points.iter().map(|p| p.period).collect();
        assert_eq!(
            periods,
            vec![
                Period::new(2024, 1).unwrap(),
                Period::new(2024, 2).unwrap(),
                Period::new(2024, 3).unwrap()
            ]
        );
        assert_eq!(run.summary.latest_ev_total, 5000);
        assert_eq!(run.metrics.rows.len(), 3);
        assert_eq!(view.history.len(), 12);
    }

    #[test]
    fn no_county_shows_overview_only() {
        let view = build_dashboard(&resources(), &RawSelection::default()).unwrap();
        assert!(view.forecast.is_none());
        assert!(view.notice.is_none());
        assert_eq!(view.horizon, 6);
        assert_eq!(view.overview.counties, 3);
        let names: Vec<&str> = view.counties.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["King", "Pierce", "Snohomish"]);
        assert_eq!(view.counties[0].label, "King, WA");
    }

    #[test]
    fn unknown_county_is_a_notice() {
        let view = build_dashboard(&resources(), &select(Some("Atlantis"), Some("3"))).unwrap();
        assert!(view.forecast.is_none());
        assert!(view.summary.is_none());
        let notice = view.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::InvalidSelection);
        assert!(notice.message.contains("Atlantis"));
    }

    #[test]
    fn out_of_range_horizons_are_notices() {
        for bad in ["0", "-1", "13", "abc"] {
            let view = build_dashboard(&resources(), &select(Some("King"), Some(bad))).unwrap();
            assert!(view.forecast.is_none(), "horizon {bad}");
            assert_eq!(view.notice.unwrap().kind, NoticeKind::InvalidSelection);
            // The county facts still render.
            assert!(view.summary.is_some());
            assert_eq!(view.horizon, 6);
        }
    }

    #[test]
    fn missing_dataset_is_fatal() {
        let resources = Resources::new(DashConfig {
            data_path: fixture("missing.csv"),
            model_path: fixture("forest_model.json"),
            ..DashConfig::default()
        });
        let err = build_dashboard(&resources, &RawSelection::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn every_county_has_history() {
        let resources = resources();
        let dataset = resources.dataset().unwrap();
        for name in dataset.county_names() {
            assert!(!dataset.history(name).unwrap().records.is_empty(), "{name}");
        }
        assert_eq!(county_summaries(&dataset).len(), 3);
    }

    #[test]
    fn validate_selection_rejects_blank_county() {
        let resources = resources();
        let dataset = resources.dataset().unwrap();
        assert_eq!(
            validate_selection(&dataset, Some("  "), "3", 12),
            Err(SelectionError::MissingCounty)
        );
        assert_eq!(
            validate_selection(&dataset, Some("King"), "3", 12).unwrap().1.months(),
            3
        );
    }
}
