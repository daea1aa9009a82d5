//! Terminal plotting for the non-interactive `plot` subcommand.

pub mod ascii;

pub use ascii::render_ascii_plot;
