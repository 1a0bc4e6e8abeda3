//! HTML rendering for the dashboard page.
//!
//! The page is assembled with `format!`; every value that came from the
//! dataset or the query string goes through `escape`. Charts are inline SVG.

use std::fmt::Write as _;

use crate::app::pipeline::{DashboardView, ForecastRun, Notice, NoticeKind};
use crate::error::DashError;
use crate::forecast::{CountySummary, DatasetOverview, Outlook};
use crate::plot::{SVG_HEIGHT, SVG_WIDTH, forecast_chart, history_chart, render_svg};
use crate::report::{fmt_count, fmt_pct, fmt_signed_count};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f5f6fa; color: #2d3748; }
header { background: linear-gradient(135deg, #667eea, #764ba2); color: white; padding: 1.5rem 2rem; }
header h1 { margin: 0; font-size: 1.6rem; }
header p { margin: 0.3rem 0 0; opacity: 0.9; }
main { max-width: 960px; margin: 0 auto; padding: 1.5rem; }
section { background: white; border-radius: 10px; padding: 1.2rem 1.5rem; margin-bottom: 1.2rem; box-shadow: 0 2px 8px rgba(0,0,0,0.06); }
form { display: flex; gap: 1rem; align-items: end; flex-wrap: wrap; }
label { display: flex; flex-direction: column; font-size: 0.85rem; font-weight: 600; gap: 0.3rem; }
select, input { padding: 0.45rem; font-size: 1rem; }
button { padding: 0.55rem 1.2rem; font-size: 1rem; background: #667eea; color: white; border: 0; border-radius: 6px; cursor: pointer; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 0.8rem; }
.card { background: #f7f8fc; border-radius: 8px; padding: 0.8rem; }
.card .k { font-size: 0.75rem; text-transform: uppercase; letter-spacing: 0.05em; color: #718096; }
.card .v { font-size: 1.25rem; font-weight: 700; margin-top: 0.25rem; }
.notice { border-left: 4px solid #e53e3e; background: #fff5f5; }
.notice.inference { border-color: #dd6b20; background: #fffaf0; }
.outlook { border-left: 4px solid #667eea; }
.outlook.strong { border-color: #38a169; } .outlook.moderate { border-color: #3182ce; }
.outlook.slow { border-color: #d69e2e; } .outlook.declining { border-color: #e53e3e; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 0.4rem 0.6rem; border-bottom: 1px solid #edf2f7; text-align: right; }
th:first-child, td:first-child { text-align: left; }
svg { max-width: 100%; height: auto; }
"#;

/// Escape text for HTML element content and quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut body = String::new();
    body.push_str(&selection_form(view));

    if let Some(notice) = &view.notice {
        body.push_str(&notice_section(notice));
    }

    match &view.summary {
        Some(summary) => {
            body.push_str(&summary_section(summary));
            if let Some(chart) = history_chart(&view.history) {
                let title = format!("EV adoption history: {}", summary.county);
                body.push_str(&chart_section("Historical trends", &render_svg(&chart, &title, SVG_WIDTH, SVG_HEIGHT)));
            }
        }
        None => body.push_str(&overview_section(&view.overview)),
    }

    if let Some(run) = &view.forecast {
        body.push_str(&forecast_sections(run, view));
    }

    document("EV Adoption Forecast", &body)
}

/// Page shown when the inputs cannot be loaded at all.
pub fn render_error(err: &DashError) -> String {
    let body = format!(
        "<section class=\"notice\"><h2>Dashboard unavailable</h2><p>{}</p></section>",
        escape(&err.to_string())
    );
    document("EV Adoption Forecast - error", &body)
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
<header><h1>EV Adoption Forecast</h1><p>County-level electric vehicle adoption forecasting</p></header>\n\
<main>\n{body}</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn selection_form(view: &DashboardView) -> String {
    let mut options = String::from("<option value=\"\">Choose a county</option>");
    for county in &view.counties {
        let selected = if view.selected.as_deref() == Some(county.name.as_str()) { " selected" } else { "" };
        let _ = write!(
            options,
            "<option value=\"{}\"{selected}>{}</option>",
            escape(&county.name),
            escape(&county.label)
        );
    }

    format!(
        "<section><form method=\"get\" action=\"/\">\
<label>County<select name=\"county\">{options}</select></label>\
<label>Forecast horizon (months)<input type=\"number\" name=\"horizon\" min=\"1\" max=\"{max}\" value=\"{h}\"></label>\
<button type=\"submit\">Generate forecast</button></form></section>\n",
        max = view.max_horizon,
        h = view.horizon,
    )
}

fn notice_section(notice: &Notice) -> String {
    let (class, heading) = match notice.kind {
        NoticeKind::InvalidSelection => ("notice", "Invalid selection"),
        NoticeKind::Inference => ("notice inference", "Forecast unavailable"),
    };
    format!(
        "<section class=\"{class}\"><strong>{heading}:</strong> {}</section>\n",
        escape(&notice.message)
    )
}

fn card(key: &str, value: &str) -> String {
    format!(
        "<div class=\"card\"><div class=\"k\">{}</div><div class=\"v\">{}</div></div>",
        escape(key),
        escape(value)
    )
}

fn summary_section(s: &CountySummary) -> String {
    let cards = [
        card("County", &s.county),
        card("State", &s.state),
        card("Data points", &s.data_points.to_string()),
        card("Data quality", &format!("{:.0}%", s.data_quality_pct)),
        card("Latest EV total", &fmt_count(s.latest_ev_total as f64)),
        card("EV share", &format!("{:.2}%", s.latest_ev_percent)),
        card("BEVs", &fmt_count(s.latest_bev as f64)),
        card("PHEVs", &fmt_count(s.latest_phev as f64)),
        card("Recent growth", &fmt_pct(s.recent_growth_pct)),
    ]
    .concat();
    format!(
        "<section><h2>County overview</h2><div class=\"cards\">{cards}</div>\
<p>Data coverage: {} to {}</p></section>\n",
        s.first_period.long_label(),
        s.last_period.long_label()
    )
}

fn overview_section(ov: &DatasetOverview) -> String {
    let cards = [
        card("Counties", &ov.counties.to_string()),
        card("States", &ov.states.to_string()),
        card("Data points", &fmt_count(ov.records as f64)),
        card("Data span", &format!("{} months", ov.span_months)),
    ]
    .concat();

    let mut top = String::new();
    for (i, c) in ov.top_counties.iter().enumerate() {
        let _ = write!(
            top,
            "<li>{}. <strong>{}, {}</strong> - {} data points</li>",
            i + 1,
            escape(&c.county),
            escape(&c.state),
            c.data_points
        );
    }

    format!(
        "<section><h2>Dataset overview</h2><div class=\"cards\">{cards}</div>\
<p>Coverage period: {} to {}</p><h3>Counties with most data</h3><ul>{top}</ul>\
<p>Select a county above to see its history and generate a forecast.</p></section>\n",
        ov.first_period.long_label(),
        ov.last_period.long_label()
    )
}

fn chart_section(heading: &str, svg: &Result<String, String>) -> String {
    let content = match svg {
        Ok(svg) => svg.clone(),
        Err(message) => format!("<p>{}</p>", escape(message)),
    };
    format!("<section><h2>{}</h2>{content}</section>\n", escape(heading))
}

fn outlook_class(outlook: Outlook) -> &'static str {
    match outlook {
        Outlook::Strong => "strong",
        Outlook::Moderate => "moderate",
        Outlook::Slow => "slow",
        Outlook::Declining => "declining",
    }
}

fn forecast_sections(run: &ForecastRun, view: &DashboardView) -> String {
    let m = &run.metrics;
    let mut out = String::new();

    if let Some(chart) = forecast_chart(&view.history, &run.points) {
        let title = format!("{}-month EV forecast: {}", run.horizon, run.summary.county);
        out.push_str(&chart_section("Forecast", &render_svg(&chart, &title, SVG_WIDTH, SVG_HEIGHT)));
    }

    let cards = [
        card("Latest actual", &fmt_count(m.last_historical)),
        card("Final forecast", &fmt_count(m.last_forecast)),
        card("Total growth", &format!("{} ({})", fmt_signed_count(m.total_growth), fmt_pct(m.growth_pct))),
        card("Avg monthly growth", &fmt_signed_count(m.avg_monthly_growth)),
    ]
    .concat();
    let _ = write!(
        out,
        "<section><h2>Forecast metrics</h2><div class=\"cards\">{cards}</div>\
<p>Model: {}</p></section>\n",
        escape(&run.model)
    );

    let mut rows = String::new();
    for r in &m.rows {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            r.period.long_label(),
            fmt_count(r.predicted_value),
            fmt_signed_count(r.monthly_change),
            fmt_signed_count(r.cumulative_growth),
            fmt_pct(r.growth_pct),
        );
    }
    let _ = write!(
        out,
        "<section><h2>Detailed forecast</h2><table><thead><tr><th>Month</th><th>Predicted EV total</th>\
<th>Monthly change</th><th>Cumulative growth</th><th>Growth %</th></tr></thead><tbody>{rows}</tbody></table></section>\n"
    );

    let _ = write!(
        out,
        "<section class=\"outlook {}\"><strong>{}:</strong> {}</section>\n",
        outlook_class(m.outlook),
        m.outlook.headline(),
        m.outlook.detail()
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"K&W\"</b>"), "&lt;b&gt;&quot;K&amp;W&quot;&lt;/b&gt;");
        assert_eq!(escape("O'Brien"), "O&#39;Brien");
        assert_eq!(escape("King"), "King");
    }

    #[test]
    fn error_page_escapes_the_message() {
        let err = DashError::malformed("<data>.csv", Some(3), "bad");
        let html = render_error(&err);
        assert!(html.contains("&lt;data&gt;.csv"));
        assert!(!html.contains("<data>"));
    }
}
