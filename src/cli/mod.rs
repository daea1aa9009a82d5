//! Command-line parsing for the UK COVID-19 dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from data
//! fetching, wrangling, and presentation.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::Dataset;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covid", version, about = "UK COVID-19 dashboard (coronavirus.data.gov.uk)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(SourceArgs),
    /// Fetch fresh data from the API and rewrite the snapshot file.
    Fetch(SourceArgs),
    /// Print a wrangled table.
    Table(ViewArgs),
    /// Render an ASCII line plot of a wrangled table.
    Plot(PlotArgs),
    /// Export a wrangled table to CSV.
    Export(ExportArgs),
}

/// Where data comes from.
#[derive(Debug, Args, Clone, Default)]
pub struct SourceArgs {
    /// Snapshot file to read at startup (and rewrite after a live fetch).
    #[arg(long, value_name = "JSON")]
    pub snapshot: Option<PathBuf>,

    /// Ignore the snapshot and fetch from the API at startup.
    #[arg(long)]
    pub live: bool,

    /// API area type (overview, nation, region, ...).
    #[arg(long)]
    pub area_type: Option<String>,

    /// API area name (e.g. england); omit for the whole UK.
    #[arg(long)]
    pub area_name: Option<String>,
}

/// Which slice of which table to show.
#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Dataset to show.
    #[arg(short = 'd', long, value_enum, default_value_t = Dataset::Daily)]
    pub dataset: Dataset,

    /// Comma-separated columns to include (default: all columns of the dataset).
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// First date to include (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

/// Options for the ASCII plot.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Use a logarithmic vertical scale.
    #[arg(long)]
    pub log: bool,
}

/// Options for CSV export.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}
