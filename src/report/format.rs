//! Formatted terminal output and shared number formatting.
//!
//! We keep formatting code in one place so:
//! - forecasting code stays clean and testable
//! - the CLI, TUI and HTML page print numbers the same way

use crate::app::pipeline::ForecastRun;
use crate::forecast::{CountySummary, DatasetOverview, ForecastMetrics};

/// Whole number with thousands separators: `5100.4` -> `5,100`.
pub fn fmt_count(v: f64) -> String {
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Like `fmt_count` with an explicit sign: `+1,200`, `-35`, `+0`.
pub fn fmt_signed_count(v: f64) -> String {
    let s = fmt_count(v);
    if s.starts_with('-') { s } else { format!("+{s}") }
}

/// Signed percentage with one decimal, or `n/a`.
pub fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(p) => format!("{p:+.1}%"),
        None => "n/a".to_string(),
    }
}

/// County facts block.
pub fn format_county_summary(s: &CountySummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ({}) ===\n", s.county, s.state));
    out.push_str(&format!(
        "Coverage: {} to {} | {} data points | quality {:.0}%\n",
        s.first_period.long_label(),
        s.last_period.long_label(),
        s.data_points,
        s.data_quality_pct
    ));
    out.push_str(&format!(
        "Latest: {} EVs ({:.2}% of vehicles) | BEV {} | PHEV {}\n",
        fmt_count(s.latest_ev_total as f64),
        s.latest_ev_percent,
        fmt_count(s.latest_bev as f64),
        fmt_count(s.latest_phev as f64),
    ));
    out.push_str(&format!("Recent growth (MoM): {}\n", fmt_pct(s.recent_growth_pct)));
    out
}

/// Headline metrics plus the detailed per-month table.
pub fn format_forecast_table(metrics: &ForecastMetrics) -> String {
    let mut out = String::new();

    out.push_str(
        format!(
            "{:<16} {:>14} {:>14} {:>16} {:>9}",
            "Month", "Predicted", "Monthly chg", "Cumulative", "Growth %"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<16} {:-<14} {:-<14} {:-<16} {:-<9}", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in &metrics.rows {
        out.push_str(
            format!(
                "{:<16} {:>14} {:>14} {:>16} {:>9}",
                r.period.long_label(),
                fmt_count(r.predicted_value),
                fmt_signed_count(r.monthly_change),
                fmt_signed_count(r.cumulative_growth),
                fmt_pct(r.growth_pct),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Full `evdash forecast` output.
pub fn format_forecast_report(run: &ForecastRun) -> String {
    let m = &run.metrics;
    let mut out = format_county_summary(&run.summary);

    out.push_str(&format!("\nForecast: {} months | model: {}\n", run.horizon, run.model));
    out.push_str(&format!(
        "Latest actual {} -> forecast {} | total {} ({}) | avg monthly {}\n\n",
        fmt_count(m.last_historical),
        fmt_count(m.last_forecast),
        fmt_signed_count(m.total_growth),
        fmt_pct(m.growth_pct),
        fmt_signed_count(m.avg_monthly_growth),
    ));
    out.push_str(&format_forecast_table(m));
    out.push_str(&format!("\n{}: {}\n", m.outlook.headline(), m.outlook.detail()));
    out
}

/// `evdash counties` table.
pub fn format_counties(summaries: &[CountySummary]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<20} {:<8} {:>7} {:>9} {:>9} {:>12} {:>8}",
            "County", "State", "Points", "First", "Last", "EV total", "MoM"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<20} {:-<8} {:-<7} {:-<9} {:-<9} {:-<12} {:-<8}", "", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for s in summaries {
        out.push_str(
            format!(
                "{:<20} {:<8} {:>7} {:>9} {:>9} {:>12} {:>8}",
                truncate(&s.county, 20),
                truncate(&s.state, 8),
                s.data_points,
                s.first_period.to_string(),
                s.last_period.to_string(),
                fmt_count(s.latest_ev_total as f64),
                fmt_pct(s.recent_growth_pct),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Dataset-wide overview block.
pub fn format_overview(ov: &DatasetOverview) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Counties: {} | States: {} | Records: {}\n",
        ov.counties,
        ov.states,
        fmt_count(ov.records as f64)
    ));
    out.push_str(&format!(
        "Coverage: {} to {} ({} months)\n",
        ov.first_period.long_label(),
        ov.last_period.long_label(),
        ov.span_months
    ));
    if !ov.top_counties.is_empty() {
        out.push_str("Counties with most data:\n");
        for (i, c) in ov.top_counties.iter().enumerate() {
            out.push_str(&format!("{:>2}. {}, {} - {} data points\n", i + 1, c.county, c.state, c.data_points));
        }
    }
    out
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
