//! Data acquisition: live API and cached snapshot.
//!
//! Both produce the same `RawRecord` list; the pipeline does not care which
//! one it is talking to.

pub mod api;
pub mod snapshot;

pub use api::{ApiClient, ApiSource};
pub use snapshot::{SnapshotSource, read_snapshot, write_snapshot};

use crate::domain::RawRecord;
use crate::error::AppError;

/// Anything that can hand back a list of raw daily records.
pub trait RecordSource {
    fn fetch(&self) -> Result<Vec<RawRecord>, AppError>;

    /// Short human-readable label for status lines and logs.
    fn describe(&self) -> String;

    /// Called once the fetched records have wrangled cleanly.
    fn commit(&self, _records: &[RawRecord]) {}
}
