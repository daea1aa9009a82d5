//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal or a pipe
//! - deterministic output (helpful for golden tests)
//!
//! Each series gets its own symbol (`*`, `+`, `o`, `x`, `#`). Consecutive days
//! are joined with a line; a missing day (log scale dropping a zero) breaks it.

use chrono::NaiveDate;

use crate::app::dashboard::ChartData;
use crate::report::fmt_compact;

const SYMBOLS: [char; 5] = ['*', '+', 'o', 'x', '#'];

/// Render the chart data as text.
pub fn render_ascii_plot(data: &ChartData, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let origin = data.range.start;
    let x_span = (data.range.days() - 1).max(1) as f64;

    let (y_min, y_max) = match data.y_bounds() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, hi)) => (lo - 0.5, hi + 0.5),
        None => (0.0, 1.0),
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (i, series) in data.series.iter().enumerate() {
        let ch = SYMBOLS[i % SYMBOLS.len()];
        let mut prev: Option<(NaiveDate, usize, usize)> = None;
        for &(date, y) in &series.points {
            let x = map_x(day_offset(origin, date), x_span, width);
            let yy = map_y(y, y_min, y_max, height);
            match prev {
                Some((prev_date, x0, y0)) if (date - prev_date).num_days() == 1 => {
                    draw_line(&mut grid, x0, y0, x, yy, ch);
                }
                _ => draw_line(&mut grid, x, yy, x, yy, ch),
            }
            prev = Some((date, x, yy));
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | {} | y=[{}, {}] ({})\n",
        data.dataset.title(),
        data.range,
        fmt_compact(data.scale.invert(y_min)),
        fmt_compact(data.scale.invert(y_max)),
        data.scale.label(),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = data
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", SYMBOLS[i % SYMBOLS.len()], s.name))
        .collect();
    if legend.is_empty() {
        out.push_str("Legend: (no columns selected)\n");
    } else {
        out.push_str(&format!("Legend: {}\n", legend.join("  ")));
    }

    out
}

fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(offset: f64, span: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = (offset / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Never overwrites an earlier series.
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
    use crate::app::dashboard::Series;
    use crate::domain::{Dataset, DateRange, ScaleMode};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 1, day).unwrap()
    }

    fn series(name: &str, values: &[(u32, f64)]) -> Series {
        Series {
            name: name.to_string(),
            points: values.iter().map(|&(day, v)| (d(day), v)).collect(),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let data = ChartData {
            dataset: Dataset::Daily,
            range: DateRange::new(d(1), d(5)),
            scale: ScaleMode::Linear,
            series: vec![
                series("cases", &[(1, 0.0), (2, 10.0), (3, 20.0), (4, 30.0), (5, 40.0)]),
                series("deaths", &[(1, 5.0), (2, 5.0), (3, 5.0), (4, 5.0), (5, 5.0)]),
            ],
        };

        let txt = render_ascii_plot(&data, 10, 5);
        let expected = concat!(
            "Plot: Daily figures | 2021-01-01 .. 2021-01-05 | y=[-2.0, 42] (linear)\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "+***++++++\n",
            "*         \n",
            "Legend: * cases  + deaths\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn gaps_are_not_joined() {
        let data = ChartData {
            dataset: Dataset::Daily,
            range: DateRange::new(d(1), d(5)),
            scale: ScaleMode::Log,
            series: vec![series("cases", &[(1, 1.0), (5, 1.0)])],
        };
        let txt = render_ascii_plot(&data, 10, 5);
        let rows: Vec<&str> = txt.lines().collect();
        // Flat series sits in the middle row; only the two endpoints are drawn.
        assert_eq!(rows[3], "*        *");
    }

    #[test]
    fn empty_selection_still_renders() {
        let data = ChartData {
            dataset: Dataset::Vaccinations,
            range: DateRange::new(d(1), d(1)),
            scale: ScaleMode::Linear,
            series: Vec::new(),
        };
        let txt = render_ascii_plot(&data, 10, 5);
        assert!(txt.ends_with("Legend: (no columns selected)\n"));
        assert_eq!(txt.lines().count(), 7);
    }
}
