//! `uk-covid-dash` library crate.
//!
//! The binary (`covid`) is a thin wrapper around this library so that:
//!
//! - the wrangling core is testable without spawning processes or touching the network
//! - the dashboard state can be driven by both the TUI and plain CLI subcommands

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;
pub mod wrangle;
