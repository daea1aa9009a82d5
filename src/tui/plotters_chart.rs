//! Plotters-powered time-series chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! The x axis is "days since the start of the view range"; tick labels are
//! mapped back to dates. On a log view the y values are already `log10`, so
//! tick labels are mapped back through `ScaleMode::invert`.

use chrono::Duration;
use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::app::dashboard::{ChartData, Series};
use crate::domain::ChartStyle;
use crate::report::fmt_compact;

/// High-contrast palette, indexed by the column's position in its dataset.
pub const PALETTE: [(u8, u8, u8); 4] = [
    (0, 255, 255),  // cyan
    (255, 200, 0),  // amber
    (255, 0, 255),  // magenta
    (0, 255, 0),    // green
];

pub fn ratatui_color(idx: usize) -> Color {
    let (r, g, b) = PALETTE[idx % PALETTE.len()];
    Color::Rgb(r, g, b)
}

/// A render-only chart description; all data prep happens in `Dashboard::chart_data`.
pub struct CovidChart<'a> {
    pub data: &'a ChartData,
    pub style: ChartStyle,
    /// Palette index per series (parallel to `data.series`).
    pub colors: &'a [usize],
}

impl<'a> Widget for CovidChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 6 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let Some((lo, hi)) = self.data.y_bounds() else {
            buf.set_string(
                area.x,
                area.y,
                "Nothing to plot (no columns selected, or no positive values on a log scale).",
                Style::default().fg(Color::Yellow),
            );
            return;
        };
        let (y0, y1) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let pad = ((y1 - y0) * 0.05).max(1e-12);
        let (y0, y1) = (y0 - pad, y1 + pad);

        let origin = self.data.range.start;
        let x1 = ((self.data.range.days() - 1).max(1)) as f64;
        let scale = self.data.scale;
        let style = self.style;

        let segments: Vec<(RGBColor, Vec<Vec<(f64, f64)>>)> = self
            .data
            .series
            .iter()
            .zip(self.colors)
            .map(|(series, &idx)| {
                let (r, g, b) = PALETTE[idx % PALETTE.len()];
                (RGBColor(r, g, b), contiguous_segments(series, origin))
            })
            .collect();

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(0.0..x1, y0..y1)?;

            let fmt_x = |v: &f64| {
                let date = origin + Duration::days(v.round() as i64);
                date.format("%d %b %y").to_string()
            };
            let fmt_y = |v: &f64| fmt_compact(scale.invert(*v));

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&fmt_x)
                .y_label_formatter(&fmt_y)
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (color, parts) in &segments {
                for part in parts {
                    match style {
                        ChartStyle::Line => {
                            chart.draw_series(LineSeries::new(part.iter().copied(), color))?;
                        }
                        ChartStyle::Area => {
                            chart.draw_series(
                                AreaSeries::new(part.iter().copied(), y0, color.mix(0.25))
                                    .border_style(color),
                            )?;
                        }
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Split a series into runs of consecutive days (x = days since `origin`).
fn contiguous_segments(series: &Series, origin: chrono::NaiveDate) -> Vec<Vec<(f64, f64)>> {
    let mut out: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut prev_day: Option<i64> = None;
    for &(date, y) in &series.points {
        let day = (date - origin).num_days();
        match (prev_day, out.last_mut()) {
            (Some(p), Some(run)) if day == p + 1 => run.push((day as f64, y)),
            _ => out.push(vec![(day as f64, y)]),
        }
        prev_day = Some(day);
    }
    out
}
