//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw daily records as delivered by the API or snapshot (`RawRecord`)
//! - the fixed chart datasets and their column sets (`Dataset`)
//! - view settings (`ScaleMode`, `DateRange`)
//! - API request shaping (`AreaFilter`, `FieldMapping`)

pub mod types;

pub use types::*;
