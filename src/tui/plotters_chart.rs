//! Plotters-powered forecast chart widget for Ratatui.
//!
//! Series and bounds come from `plot::ChartData`, the same data the web page
//! draws as SVG. Rendering goes into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::plot::ChartData;
use crate::report::fmt_count;

/// A render-only chart over precomputed series.
pub struct ForecastPlottersChart<'a> {
    pub data: &'a ChartData,
    pub y_label: &'a str,
}

impl Widget for ForecastPlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out axes in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.data.x_bounds;
        let [y0, y1] = self.data.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let data = self.data;
        let y_label = self.y_label;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are noise at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(y_label)
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| data.label_at(*v))
                .y_label_formatter(&|v| fmt_count(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for s in &data.series {
                let color = RGBColor(s.color.0, s.color.1, s.color.2);
                chart.draw_series(LineSeries::new(s.points.iter().copied(), &color))?;
                // Markers as pixels; circle radii are mis-scaled by the backend.
                chart.draw_series(s.points.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
