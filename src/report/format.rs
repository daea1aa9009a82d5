//! Plain-text formatting for terminal output.

use crate::app::pipeline::Tables;
use crate::config::AppConfig;
use crate::domain::Dataset;
use crate::wrangle::WrangledTable;

const DATE_WIDTH: usize = 10;
const MIN_VALUE_WIDTH: usize = 12;

/// Format a wrangled table: one row per date, one right-aligned column per field.
pub fn format_table(table: &WrangledTable) -> String {
    let widths: Vec<usize> = table
        .columns()
        .iter()
        .map(|c| c.chars().count().max(MIN_VALUE_WIDTH))
        .collect();

    let mut out = String::new();

    let mut header = format!("{:<DATE_WIDTH$}", "date");
    for (name, &w) in table.columns().iter().zip(&widths) {
        header.push_str(&format!(" {name:>w$}"));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = "-".repeat(DATE_WIDTH);
    for &w in &widths {
        rule.push(' ');
        rule.push_str(&"-".repeat(w));
    }
    out.push_str(&rule);
    out.push('\n');

    for (date, values) in table.rows() {
        let mut line = format!("{:<DATE_WIDTH$}", date.to_string());
        for (v, &w) in values.iter().zip(&widths) {
            line.push_str(&format!(" {:>w$}", fmt_value(*v)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// One-paragraph summary after `covid fetch`.
pub fn format_fetch_summary(tables: &Tables, config: &AppConfig) -> String {
    let mut out = String::new();
    out.push_str("=== covid - UK COVID-19 data ===\n");
    out.push_str(&format!("Area: {}\n", config.filter.to_query()));
    out.push_str(&format!("Snapshot: {}\n", config.snapshot_path.display()));
    for dataset in Dataset::ALL {
        let table = tables.get(dataset);
        out.push_str(&format!(
            "{:<26} {} days | {}\n",
            dataset.title(),
            table.len(),
            table.span(),
        ));
    }
    out
}

/// Whole numbers print without decimals; everything else gets two.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Compact axis label: 1234 -> 1.2k, 2500000 -> 2.5M.
pub fn fmt_compact(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}G", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e3 {
        format!("{:.1}k", v / 1e3)
    } else if a >= 10.0 || v == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
