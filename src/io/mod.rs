//! Input/output helpers.
//!
//! - table exports to CSV (`export`)
//!
//! Raw record I/O (API pages, snapshot files) lives in `crate::data`.

pub mod export;

pub use export::*;
