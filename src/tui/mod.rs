//! Ratatui-based terminal dashboard.
//!
//! A county list on the left, the forecast chart and metrics on the right.
//! Every interaction rebuilds the view through `app::pipeline::build_dashboard`,
//! the same path the web page takes.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::pipeline::{DashboardView, NoticeKind, RawSelection, build_dashboard};
use crate::app::resources::Resources;
use crate::domain::DashConfig;
use crate::error::AppError;
use crate::plot::{forecast_chart, history_chart};
use crate::report::{fmt_count, fmt_pct, fmt_signed_count, truncate};

mod plotters_chart;

use plotters_chart::ForecastPlottersChart;

/// Start the TUI.
pub fn run(config: DashConfig) -> Result<(), AppError> {
    // Load before touching the terminal so failures print normally.
    let resources = Resources::new(config);
    resources.preload()?;
    let mut app = App::new(resources)?;

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    resources: Resources,
    view: DashboardView,
    /// Highlighted row in the county list.
    cursor: usize,
    horizon: u32,
    status: String,
}

impl App {
    fn new(resources: Resources) -> Result<Self, AppError> {
        let view = build_dashboard(&resources, &RawSelection::default())?;
        let horizon = view.horizon;
        let status = format!(
            "{} counties loaded. Pick one and press Enter.",
            view.overview.counties
        );
        Ok(Self {
            resources,
            view,
            cursor: 0,
            horizon,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        let last = self.view.counties.len().saturating_sub(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor = (self.cursor + 1).min(last),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = last,
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => self.adjust_horizon(1),
            KeyCode::Char('-') | KeyCode::Left => self.adjust_horizon(-1),
            KeyCode::Enter => self.forecast_selected()?,
            _ => {}
        }
        Ok(false)
    }

    fn adjust_horizon(&mut self, delta: i64) {
        let max = self.view.max_horizon;
        let next = (i64::from(self.horizon) + delta).clamp(1, i64::from(max));
        self.horizon = u32::try_from(next).unwrap_or(max);
        self.status = format!("horizon: {} months (Enter to forecast)", self.horizon);
    }

    fn forecast_selected(&mut self) -> Result<(), AppError> {
        let Some(county) = self.view.counties.get(self.cursor).map(|c| c.name.clone()) else {
            self.status = "No counties in the dataset.".to_string();
            return Ok(());
        };
        let raw = RawSelection {
            county: Some(county.clone()),
            horizon: Some(self.horizon.to_string()),
        };
        // Load failures cannot happen after preload; anything else is a notice.
        self.view = build_dashboard(&self.resources, &raw)?;
        self.status = match (&self.view.forecast, &self.view.notice) {
            (Some(run), _) => format!("{}: {}", county, run.metrics.outlook.headline()),
            (None, Some(notice)) => notice.message.clone(),
            (None, None) => format!("{county}: nothing to show"),
        };
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let ov = &self.view.overview;
        let line = Line::from(vec![
            Span::styled("evdash", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " | {} counties, {} states | {} to {} | horizon: {} months (max {})",
                ov.counties,
                ov.states,
                ov.first_period,
                ov.last_period,
                self.horizon,
                self.view.max_horizon,
            )),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(0)])
            .split(area);

        self.draw_counties(frame, columns[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(10)])
            .split(columns[1]);

        self.draw_chart(frame, right[0]);
        self.draw_metrics(frame, right[1]);
    }

    fn draw_counties(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .view
            .counties
            .iter()
            .map(|c| {
                let style = if self.view.selected.as_deref() == Some(c.name.as_str()) {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(truncate(&c.label, 22)).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Counties").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match (&self.view.summary, &self.view.forecast) {
            (Some(s), Some(run)) => format!("{}, {}: {}-month forecast", s.county, s.state, run.horizon),
            (Some(s), None) => format!("{}, {}: history", s.county, s.state),
            _ => "Forecast".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let chart = match &self.view.forecast {
            Some(run) => forecast_chart(&self.view.history, &run.points),
            None => history_chart(&self.view.history),
        };
        let Some(data) = chart else {
            let msg = Paragraph::new("Select a county and press Enter to generate a forecast.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        frame.render_widget(
            ForecastPlottersChart {
                data: &data,
                y_label: "EV total",
            },
            inner,
        );
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(notice) = &self.view.notice {
            let color = match notice.kind {
                NoticeKind::InvalidSelection => Color::Red,
                NoticeKind::Inference => Color::LightRed,
            };
            lines.push(Line::from(Span::styled(notice.message.clone(), Style::default().fg(color))));
        }

        if let Some(s) = &self.view.summary {
            lines.push(Line::from(format!(
                "Latest: {} EVs ({:.2}% of vehicles) | BEV {} | PHEV {} | {} points, quality {:.0}%",
                fmt_count(s.latest_ev_total as f64),
                s.latest_ev_percent,
                fmt_count(s.latest_bev as f64),
                fmt_count(s.latest_phev as f64),
                s.data_points,
                s.data_quality_pct,
            )));
        }

        if let Some(run) = &self.view.forecast {
            let m = &run.metrics;
            lines.push(Line::from(format!(
                "Final forecast: {} | growth {} ({}) | avg/month {}",
                fmt_count(m.last_forecast),
                fmt_signed_count(m.total_growth),
                fmt_pct(m.growth_pct),
                fmt_signed_count(m.avg_monthly_growth),
            )));
            lines.push(Line::from(Span::styled(
                format!("{}: {}", m.outlook.headline(), m.outlook.detail()),
                Style::default().fg(Color::Green),
            )));
            let steps: Vec<String> = m
                .rows
                .iter()
                .map(|r| format!("{} {}", r.period, fmt_count(r.predicted_value)))
                .collect();
            lines.push(Line::from(Span::styled(steps.join("  "), Style::default().fg(Color::Gray))));
        }

        if lines.is_empty() {
            let ov = &self.view.overview;
            lines.push(Line::from(format!(
                "{} records across {} months.",
                fmt_count(ov.records as f64),
                ov.span_months
            )));
            for c in &ov.top_counties {
                lines.push(Line::from(format!("  {}, {}: {} data points", c.county, c.state, c.data_points)));
            }
        }

        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Metrics").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ county  +/- horizon  Enter forecast  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;

    fn app() -> App {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        let resources = Resources::new(DashConfig {
            data_path: dir.join("ev_sample.csv"),
            model_path: dir.join("forest_model.json"),
            ..DashConfig::default()
        });
        App::new(resources).unwrap()
    }

    #[test]
    fn enter_forecasts_highlighted_county() {
        let mut app = app();
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Char('-')).unwrap();
        app.handle_key(KeyCode::Enter).unwrap();

        assert_eq!(app.view.selected.as_deref(), Some("Pierce"));
        assert_eq!(app.view.forecast.as_ref().unwrap().points.len(), 5);
        assert!(app.view.notice.is_none());
    }

    #[test]
    fn horizon_stays_within_bounds() {
        let mut app = app();
        for _ in 0..20 {
            app.handle_key(KeyCode::Char('+')).unwrap();
        }
        assert_eq!(app.horizon, 12);
        for _ in 0..20 {
            app.handle_key(KeyCode::Left).unwrap();
        }
        assert_eq!(app.horizon, 1);
    }

    #[test]
    fn cursor_stays_on_the_list() {
        let mut app = app();
        app.handle_key(KeyCode::Up).unwrap();
        assert_eq!(app.cursor, 0);
        for _ in 0..10 {
            app.handle_key(KeyCode::Char('j')).unwrap();
        }
        assert_eq!(app.cursor, 2);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn draws_into_a_test_terminal() {
        let mut app = app();
        app.handle_key(KeyCode::Enter).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(rendered.contains("Counties"));
        assert!(rendered.contains("King, WA: 6-month forecast"));
    }
}
