//! Cached snapshot file.
//!
//! A snapshot is a JSON array of raw records, exactly as the API returns
//! them after field renaming:
//!
//! ```json
//! [{"Date": "2021-01-01", "cases": 100, "hospital": null}, ...]
//! ```

use std::fs::{File, create_dir_all, remove_file, rename};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::data::RecordSource;
use crate::domain::RawRecord;
use crate::error::AppError;

/// Read a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Vec<RawRecord>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open snapshot '{}': {e}", path.display())))?;
    let records: Vec<RawRecord> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::usage(format!("Invalid snapshot '{}': {e}", path.display())))?;
    info!(path = %path.display(), records = records.len(), "loaded snapshot");
    Ok(records)
}

/// Write (replace) a snapshot file, creating parent directories as needed.
///
/// Records go to a sibling `.tmp` file first, which is renamed over `path`
/// only once fully flushed. A failed write leaves the old snapshot in place.
pub fn write_snapshot(path: &Path, records: &[RawRecord]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            AppError::usage(format!("Failed to create snapshot dir '{}': {e}", parent.display()))
        })?;
    }
    let tmp = path.with_extension("tmp");
    let file = File::create(&tmp)
        .map_err(|e| AppError::usage(format!("Failed to create snapshot '{}': {e}", tmp.display())))?;
    if let Err(err) = write_records(BufWriter::new(file), records) {
        let _ = remove_file(&tmp);
        return Err(err);
    }
    rename(&tmp, path).map_err(|e| {
        let _ = remove_file(&tmp);
        AppError::usage(format!("Failed to replace snapshot '{}': {e}", path.display()))
    })?;
    info!(path = %path.display(), records = records.len(), "wrote snapshot");
    Ok(())
}

fn write_records<W: Write>(mut writer: W, records: &[RawRecord]) -> Result<(), AppError> {
    serde_json::to_writer(&mut writer, records)
        .map_err(|e| AppError::usage(format!("Failed to write snapshot: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to flush snapshot: {e}")))
}

/// A snapshot file as a record source.
pub struct SnapshotSource {
    pub path: PathBuf,
}

impl RecordSource for SnapshotSource {
    fn fetch(&self) -> Result<Vec<RawRecord>, AppError> {
        read_snapshot(&self.path)
    }

    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_write_then_read() {
        let dir = std::env::temp_dir().join(format!("covid-snapshot-{}", std::process::id()));
        let path = dir.join("nested").join("snap.json");
        let records = vec![
            RawRecord::new("2021-01-02").with("cases", 5).with("deaths", serde_json::Value::Null),
            RawRecord::new("2021-01-01").with("cases", 3),
        ];

        write_snapshot(&path, &records).unwrap();
        let back = SnapshotSource { path: path.clone() }.fetch().unwrap();
        assert_eq!(back, records);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_snapshot_is_a_file_error() {
        let err = read_snapshot(Path::new("definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("here.json"));
    }

    /// Rejects every write, like a full disk.
    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left"))
        }
    }

    #[test]
    fn buffered_write_failure_is_reported() {
        let records = vec![RawRecord::new("2021-01-01").with("cases", 1)];
        // The buffer absorbs the JSON; the failure only surfaces on flush.
        let err = write_records(BufWriter::new(FullDisk), &records).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("flush"));
    }

    #[test]
    fn failed_replace_keeps_the_old_snapshot() {
        let dir = std::env::temp_dir().join(format!("covid-snapshot-replace-{}", std::process::id()));
        let path = dir.join("snap.json");
        let old = vec![RawRecord::new("2021-01-01").with("cases", 1)];
        write_snapshot(&path, &old).unwrap();

        // A directory squatting on the temp name makes the write fail up front.
        create_dir_all(path.with_extension("tmp")).unwrap();
        let new = vec![RawRecord::new("2021-01-02").with("cases", 2)];
        assert!(write_snapshot(&path, &new).is_err());
        assert_eq!(read_snapshot(&path).unwrap(), old);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
