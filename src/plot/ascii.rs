//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - historical EV totals: `o` on a `-` line
//! - forecast: `*` on a `.` line, joined to the last historical point

use crate::domain::{ForecastPoint, HistoricalRecord, Period};

/// Render history followed by forecast on a month axis.
pub fn render_forecast_plot(
    history: &[HistoricalRecord],
    forecast: &[ForecastPoint],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some(start) = history
        .first()
        .map(|r| r.period)
        .or_else(|| forecast.first().map(|p| p.period))
    else {
        return "Plot: no data\n".to_string();
    };
    let end = forecast
        .last()
        .map(|p| p.period)
        .or_else(|| history.last().map(|r| r.period))
        .unwrap_or(start);

    let actual: Vec<(f64, f64)> = history
        .iter()
        .map(|r| (month_x(r.period, start), r.ev_total as f64))
        .collect();
    let predicted: Vec<(f64, f64)> = forecast
        .iter()
        .map(|p| (month_x(p.period, start), p.predicted_value))
        .collect();

    let x_max = (end.months_since(start) as f64).max(1.0);
    let (y_min, y_max) = y_range(actual.iter().chain(&predicted)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so markers overlay them.
    draw_series(&mut grid, &actual, x_max, y_min, y_max, '-');
    let joined: Vec<(f64, f64)> = actual.last().copied().into_iter().chain(predicted.iter().copied()).collect();
    draw_series(&mut grid, &joined, x_max, y_min, y_max, '.');

    for &(x, y) in &actual {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_max, width)] = 'o';
    }
    for &(x, y) in &predicted {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_max, width)] = '*';
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {start}..{end} | EV total=[{y_min:.0}, {y_max:.0}] | o actual, * forecast\n"
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out
}

fn month_x(period: Period, start: Period) -> f64 {
    period.months_since(start) as f64
}

fn y_range<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat series: open a unit band around it.
        Some((min_y - 0.5, max_y + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = (x / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_series(grid: &mut [Vec<char>], series: &[(f64, f64)], x_max: f64, y_min: f64, y_max: f64, ch: char) {
    if series.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in series {
        let xx = map_x(x, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, xx, yy, ch);
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(month: u32, ev_total: u64) -> HistoricalRecord {
        HistoricalRecord {
            county: "King".to_string(),
            state: "WA".to_string(),
            period: Period::new(2023, month).unwrap(),
            ev_total,
            ev_percent: 1.0,
            bev_count: 0,
            phev_count: 0,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let history = vec![record(10, 100), record(11, 100), record(12, 100)];
        let forecast = vec![ForecastPoint {
            period: Period::new(2024, 1).unwrap(),
            predicted_value: 140.0,
        }];

        let txt = render_forecast_plot(&history, &forecast, 10, 5);
        let expected = concat!(
            "Plot: 2023-10..2024-01 | EV total=[98, 142] | o actual, * forecast\n",
            "         *\n",
            "        .\n",
            "        .\n",
            "       .\n",
            "o--o--o\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_inputs_do_not_panic() {
        assert_eq!(render_forecast_plot(&[], &[], 20, 5), "Plot: no data\n");

        let single = render_forecast_plot(&[record(1, 7)], &[], 20, 5);
        assert_eq!(single.lines().count(), 6);
        assert!(single.contains('o'));
    }
}
