//! Server-side SVG charts for the web dashboard.

use std::error::Error;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::plot::series::ChartData;
use crate::report::fmt_count;

pub const SVG_WIDTH: u32 = 860;
pub const SVG_HEIGHT: u32 = 360;

/// Render a line chart to an SVG document string.
pub fn render_svg(chart: &ChartData, title: &str, width: u32, height: u32) -> Result<String, String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw(&root, chart, title).map_err(|e| format!("chart rendering failed: {e}"))?;
    }
    Ok(svg)
}

fn draw(root: &DrawingArea<SVGBackend<'_>, Shift>, data: &ChartData, title: &str) -> Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;

    let [x0, x1] = data.x_bounds;
    let [y0, y1] = data.y_bounds;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 18))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 64)
        .set_label_area_size(LabelAreaPosition::Bottom, 36)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .y_labels(6)
        .x_label_formatter(&|v| data.label_at(*v))
        .y_label_formatter(&|v| fmt_count(*v))
        .y_desc("Electric vehicles")
        .light_line_style(RGBColor(235, 235, 235))
        .draw()?;

    for s in &data.series {
        let color = RGBColor(s.color.0, s.color.1, s.color.2);
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.85))
        .border_style(RGBColor(180, 180, 180))
        .draw()?;

    root.present()?;
    Ok(())
}
