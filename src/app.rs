//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and loads configuration
//! - sets up logging
//! - loads/fetches data and wrangles it
//! - dispatches to the TUI or prints tables/plots/exports

use clap::Parser;
use tracing::info;

use crate::app::dashboard::Dashboard;
use crate::cli::{Command, ExportArgs, PlotArgs, SourceArgs, ViewArgs};
use crate::config::AppConfig;
use crate::data::ApiSource;
use crate::domain::{DateRange, ScaleMode};
use crate::error::AppError;

pub mod dashboard;
pub mod pipeline;

/// Entry point for the `covid` binary.
pub fn run() -> Result<(), AppError> {
    // `covid` and `covid --live` behave like `covid tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let config = AppConfig::from_env()?;

    match cli.command {
        Command::Tui(args) => handle_tui(config, &args),
        Command::Fetch(args) => {
            crate::logging::init_stderr();
            handle_fetch(config.apply_source_args(&args))
        }
        Command::Table(args) => {
            crate::logging::init_stderr();
            handle_table(config, &args)
        }
        Command::Plot(args) => {
            crate::logging::init_stderr();
            handle_plot(config, &args)
        }
        Command::Export(args) => {
            crate::logging::init_stderr();
            handle_export(config, &args)
        }
    }
}

fn handle_tui(config: AppConfig, args: &SourceArgs) -> Result<(), AppError> {
    let config = config.apply_source_args(args);
    crate::logging::init_file(&config.log_file)?;
    crate::tui::run(config)
}

fn handle_fetch(config: AppConfig) -> Result<(), AppError> {
    let source = ApiSource::from_config(&config)?;
    let tables = pipeline::fetch_tables(&source)?;
    println!("{}", crate::report::format_fetch_summary(&tables, &config));
    Ok(())
}

fn handle_table(config: AppConfig, args: &ViewArgs) -> Result<(), AppError> {
    let dash = dashboard_for_view(config, args)?;
    let table = dash.selected_table(args.dataset)?;
    print!("{}", crate::report::format_table(&table));
    Ok(())
}

fn handle_plot(config: AppConfig, args: &PlotArgs) -> Result<(), AppError> {
    let mut dash = dashboard_for_view(config, &args.view)?;
    if args.log {
        dash.set_scale(args.view.dataset, ScaleMode::Log);
    }
    let data = dash.chart_data(args.view.dataset);
    print!("{}", crate::plot::render_ascii_plot(&data, args.width, args.height));
    Ok(())
}

fn handle_export(config: AppConfig, args: &ExportArgs) -> Result<(), AppError> {
    let dash = dashboard_for_view(config, &args.view)?;
    let table = dash.selected_table(args.view.dataset)?;
    crate::io::export::write_table_csv(&args.out, &table)?;
    info!(path = %args.out.display(), rows = table.len(), "exported table");
    Ok(())
}

/// Load tables and apply the view flags, the way the TUI widgets would.
pub fn dashboard_for_view(config: AppConfig, args: &ViewArgs) -> Result<Dashboard, AppError> {
    let config = config.apply_source_args(&args.source);
    let tables = pipeline::load_startup_tables(&config)?;
    let mut dash = Dashboard::new(tables);
    apply_view_args(&mut dash, args)?;
    Ok(dash)
}

fn apply_view_args(dash: &mut Dashboard, args: &ViewArgs) -> Result<(), AppError> {
    let dataset = args.dataset;

    if !args.columns.is_empty() {
        let available = dash.table(dataset).columns();
        let columns: Vec<String> = args.columns.iter().map(|c| c.trim().to_string()).collect();
        if let Some(unknown) = columns.iter().find(|c| !available.contains(c)) {
            return Err(AppError::usage(
                format!(
                    "Unknown column '{unknown}' for {:?}. Available: {}.",
                    dataset,
                    available.join(", ")
                ),
            ));
        }
        dash.select_columns(dataset, &columns);
    }

    let span = dash.table(dataset).span();
    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            return Err(AppError::usage(format!("--from {from} is after --to {to}.")));
        }
    }
    let outside = args.from.is_some_and(|from| from > span.end)
        || args.to.is_some_and(|to| to < span.start);
    if outside {
        let requested = format!(
            "{} .. {}",
            args.from.map_or_else(|| "start".to_string(), |d| d.to_string()),
            args.to.map_or_else(|| "end".to_string(), |d| d.to_string()),
        );
        return Err(AppError::usage(format!("Requested dates {requested} are outside the data ({span}).")));
    }
    let range = DateRange::new(
        args.from.unwrap_or(span.start),
        args.to.unwrap_or(span.end),
    );
    dash.set_range(dataset, range);
    Ok(())
}

/// Rewrite argv so `covid` defaults to `covid tui`.
///
/// Rules:
/// - `covid`                          -> `covid tui`
/// - `covid --live ...`               -> `covid tui --live ...`
/// - `covid --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "fetch" | "table" | "plot" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::app::pipeline::wrangle_tables;
    use crate::domain::{Dataset, RawRecord};

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["covid"])), argv(&["covid", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["covid", "--live"])),
            argv(&["covid", "tui", "--live"])
        );
        assert_eq!(rewrite_args(argv(&["covid", "--help"])), argv(&["covid", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["covid", "plot", "--log"])),
            argv(&["covid", "plot", "--log"])
        );
    }

    #[test]
    fn view_args_parse_from_the_command_line() {
        let cli = crate::cli::Cli::parse_from(argv(&[
            "covid",
            "export",
            "--dataset",
            "vaccinations",
            "--columns",
            "first dose,second dose",
            "--from",
            "2021-01-10",
            "--out",
            "out.csv",
        ]));
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.view.dataset, Dataset::Vaccinations);
        assert_eq!(args.view.columns, vec!["first dose", "second dose"]);
        assert_eq!(args.view.from, NaiveDate::from_ymd_opt(2021, 1, 10));
    }

    fn view_args(columns: &[&str], from: Option<&str>, to: Option<&str>) -> ViewArgs {
        ViewArgs {
            source: SourceArgs::default(),
            dataset: Dataset::Daily,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            from: from.map(|s| s.parse().unwrap()),
            to: to.map(|s| s.parse().unwrap()),
        }
    }

    fn small_dashboard() -> Dashboard {
        let records: Vec<RawRecord> = (1..=4)
            .map(|day| RawRecord::new(format!("2021-01-0{day}")).with("cases", day))
            .collect();
        Dashboard::new(wrangle_tables(&records).unwrap())
    }

    #[test]
    fn view_args_select_columns_range_and_scale() {
        let mut dash = small_dashboard();
        apply_view_args(&mut dash, &view_args(&["cases"], Some("2021-01-02"), None)).unwrap();
        let view = dash.view(Dataset::Daily);
        assert_eq!(view.selected, vec!["cases".to_string()]);
        assert_eq!(view.range.start, NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
        assert_eq!(view.range.end, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        assert_eq!(view.scale, ScaleMode::Linear);
    }

    #[test]
    fn unknown_columns_and_disjoint_ranges_are_usage_errors() {
        let mut dash = small_dashboard();
        let err = apply_view_args(&mut dash, &view_args(&["bogus"], None, None)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("cases, hospital"));

        let err = apply_view_args(&mut dash, &view_args(&[], Some("2022-01-01"), None)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn reversed_or_one_sided_out_of_range_dates_are_rejected() {
        let mut dash = small_dashboard();
        let before = dash.view(Dataset::Daily).range;

        let err = apply_view_args(&mut dash, &view_args(&[], Some("2021-01-03"), Some("2021-01-02")))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("after"));

        let err = apply_view_args(&mut dash, &view_args(&[], None, Some("2020-12-31"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        assert_eq!(dash.view(Dataset::Daily).range, before);
    }

    #[test]
    fn log_is_a_plot_only_flag() {
        let cli = crate::cli::Cli::parse_from(argv(&["covid", "plot", "--log"]));
        let Command::Plot(args) = cli.command else {
            panic!("expected plot");
        };
        assert!(args.log);

        assert!(crate::cli::Cli::try_parse_from(argv(&["covid", "table", "--log"])).is_err());
        assert!(
            crate::cli::Cli::try_parse_from(argv(&["covid", "export", "--log", "--out", "x.csv"])).is_err()
        );
    }
}
