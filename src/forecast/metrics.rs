//! Derived numbers shown next to the charts.

use serde::Serialize;

use crate::domain::{CountyHistory, ForecastPoint, Period};
use crate::io::Dataset;

/// Records at which a county's data quality score saturates at 100%.
const FULL_QUALITY_POINTS: f64 = 50.0;

/// How many counties the dataset overview lists.
const TOP_COUNTIES: usize = 5;

/// Qualitative reading of total forecast growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outlook {
    Strong,
    Moderate,
    Slow,
    Declining,
}

impl Outlook {
    /// Band a growth percentage: `> 20` strong, `> 10` moderate, `> 0` slow.
    pub fn from_growth_pct(pct: Option<f64>) -> Self {
        match pct {
            Some(p) if p > 20.0 => Outlook::Strong,
            Some(p) if p > 10.0 => Outlook::Moderate,
            Some(p) if p > 0.0 => Outlook::Slow,
            _ => Outlook::Declining,
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Outlook::Strong => "Strong growth expected",
            Outlook::Moderate => "Moderate growth expected",
            Outlook::Slow => "Slow growth expected",
            Outlook::Declining => "Declining trend",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            Outlook::Strong => "The forecast indicates robust EV adoption with significant growth anticipated.",
            Outlook::Moderate => "The forecast shows steady EV adoption growth in this county.",
            Outlook::Slow => "The forecast indicates modest EV adoption growth.",
            Outlook::Declining => "The forecast suggests potential challenges in EV adoption growth.",
        }
    }
}

/// One line of the detailed forecast table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub period: Period,
    pub predicted_value: f64,
    /// Change versus the previous point (the last actual for the first row).
    pub monthly_change: f64,
    /// Change versus the last actual.
    pub cumulative_growth: f64,
    pub growth_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    pub last_historical: f64,
    pub last_forecast: f64,
    pub total_growth: f64,
    pub growth_pct: Option<f64>,
    pub avg_monthly_growth: f64,
    pub outlook: Outlook,
    pub rows: Vec<ForecastRow>,
}

impl ForecastMetrics {
    /// Summarize `points` against the last observed value.
    ///
    /// Returns `None` for an empty forecast.
    pub fn compute(last_historical: f64, points: &[ForecastPoint]) -> Option<Self> {
        let last_forecast = points.last()?.predicted_value;
        let total_growth = last_forecast - last_historical;
        let growth_pct = pct_of(total_growth, last_historical);

        let mut previous = last_historical;
        let rows = points
            .iter()
            .map(|p| {
                let cumulative = p.predicted_value - last_historical;
                let row = ForecastRow {
                    period: p.period,
                    predicted_value: p.predicted_value,
                    monthly_change: p.predicted_value - previous,
                    cumulative_growth: cumulative,
                    growth_pct: pct_of(cumulative, last_historical),
                };
                previous = p.predicted_value;
                row
            })
            .collect();

        Some(Self {
            last_historical,
            last_forecast,
            total_growth,
            growth_pct,
            avg_monthly_growth: total_growth / points.len() as f64,
            outlook: Outlook::from_growth_pct(growth_pct),
            rows,
        })
    }
}

fn pct_of(delta: f64, base: f64) -> Option<f64> {
    (base != 0.0).then(|| delta / base * 100.0)
}

/// Facts about one county's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountySummary {
    pub county: String,
    pub state: String,
    pub data_points: usize,
    pub first_period: Period,
    pub last_period: Period,
    pub latest_ev_total: u64,
    pub latest_ev_percent: f64,
    pub latest_bev: u64,
    pub latest_phev: u64,
    /// Month-over-month growth of the last two records, in percent.
    pub recent_growth_pct: Option<f64>,
    /// Coverage score: `min(100, data_points / 50 * 100)`.
    pub data_quality_pct: f64,
}

impl CountySummary {
    /// `None` only for a county with no records.
    pub fn from_history(history: &CountyHistory<'_>) -> Option<Self> {
        let records = history.records;
        let first = records.first()?;
        let latest = records.last()?;

        let recent_growth_pct = match records {
            [.., prev, last] => pct_of(last.ev_total as f64 - prev.ev_total as f64, prev.ev_total as f64),
            _ => None,
        };

        Some(Self {
            county: history.county.to_string(),
            state: history.state.to_string(),
            data_points: records.len(),
            first_period: first.period,
            last_period: latest.period,
            latest_ev_total: latest.ev_total,
            latest_ev_percent: latest.ev_percent,
            latest_bev: latest.bev_count,
            latest_phev: latest.phev_count,
            recent_growth_pct,
            data_quality_pct: (records.len() as f64 / FULL_QUALITY_POINTS * 100.0).min(100.0),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopCounty {
    pub county: String,
    pub state: String,
    pub data_points: usize,
}

/// Dataset-wide summary shown before a county is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetOverview {
    pub counties: usize,
    pub states: usize,
    pub records: usize,
    pub first_period: Period,
    pub last_period: Period,
    pub span_months: i64,
    pub top_counties: Vec<TopCounty>,
}

impl DatasetOverview {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut top: Vec<TopCounty> = dataset
            .histories()
            .map(|h| TopCounty {
                county: h.county.to_string(),
                state: h.state.to_string(),
                data_points: h.records.len(),
            })
            .collect();
        // Most records first; ties keep alphabetical order.
        top.sort_by(|a, b| b.data_points.cmp(&a.data_points).then_with(|| a.county.cmp(&b.county)));
        top.truncate(TOP_COUNTIES);

        Self {
            counties: dataset.county_count(),
            states: dataset.states().len(),
            records: dataset.len(),
            first_period: dataset.earliest_period(),
            last_period: dataset.latest_period(),
            span_months: dataset.latest_period().months_since(dataset.earliest_period()),
            top_counties: top,
        }
    }
}
