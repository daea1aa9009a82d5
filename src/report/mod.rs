//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so the wrangling and dashboard code
//! stays free of presentation details.

pub mod format;

pub use format::*;
