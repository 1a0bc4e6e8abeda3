//! Chart data shared by the SVG and terminal renderers.
//!
//! X values are month offsets from the first plotted period so the numeric
//! axis maps back to `Period` labels with `Period::offset`.

use crate::domain::{ForecastPoint, HistoricalRecord, Period};

pub type Rgb = (u8, u8, u8);

pub const EV_TOTAL_COLOR: Rgb = (31, 119, 180);
pub const BEV_COLOR: Rgb = (44, 160, 44);
pub const PHEV_COLOR: Rgb = (255, 127, 14);
pub const FORECAST_COLOR: Rgb = (214, 39, 40);

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub color: Rgb,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub start: Period,
    pub series: Vec<Series>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl ChartData {
    /// Period label for an x value.
    pub fn label_at(&self, x: f64) -> String {
        self.start.offset(x.round() as i64).to_string()
    }
}

/// EV total, BEV and PHEV counts over the county's history.
pub fn history_chart(history: &[HistoricalRecord]) -> Option<ChartData> {
    let start = history.first()?.period;
    let x = |r: &HistoricalRecord| r.period.months_since(start) as f64;

    let series = vec![
        Series {
            label: "EV total",
            color: EV_TOTAL_COLOR,
            points: history.iter().map(|r| (x(r), r.ev_total as f64)).collect(),
        },
        Series {
            label: "BEV",
            color: BEV_COLOR,
            points: history.iter().map(|r| (x(r), r.bev_count as f64)).collect(),
        },
        Series {
            label: "PHEV",
            color: PHEV_COLOR,
            points: history.iter().map(|r| (x(r), r.phev_count as f64)).collect(),
        },
    ];
    Some(finish(start, series))
}

/// Historical EV total followed by the forecast, joined at the last actual.
pub fn forecast_chart(history: &[HistoricalRecord], forecast: &[ForecastPoint]) -> Option<ChartData> {
    let start = history
        .first()
        .map(|r| r.period)
        .or_else(|| forecast.first().map(|p| p.period))?;

    let actual: Vec<(f64, f64)> = history
        .iter()
        .map(|r| (r.period.months_since(start) as f64, r.ev_total as f64))
        .collect();
    let predicted: Vec<(f64, f64)> = actual
        .last()
        .copied()
        .into_iter()
        .chain(
            forecast
                .iter()
                .map(|p| (p.period.months_since(start) as f64, p.predicted_value)),
        )
        .collect();

    let series = vec![
        Series {
            label: "Historical",
            color: EV_TOTAL_COLOR,
            points: actual,
        },
        Series {
            label: "Forecast",
            color: FORECAST_COLOR,
            points: predicted,
        },
    ];
    Some(finish(start, series))
}

fn finish(start: Period, series: Vec<Series>) -> ChartData {
    let all = || series.iter().flat_map(|s| s.points.iter());

    let x_max = all().map(|p| p.0).fold(0.0_f64, f64::max).max(1.0);
    let y_lo = all().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_hi = all().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let (y_lo, y_hi) = if y_lo.is_finite() && y_hi.is_finite() {
        (y_lo, y_hi)
    } else {
        (0.0, 1.0)
    };
    let pad = ((y_hi - y_lo) * 0.05).max(1.0);

    ChartData {
        start,
        x_bounds: [0.0, x_max],
        y_bounds: [(y_lo - pad).max(0.0), y_hi + pad],
        series,
    }
}
