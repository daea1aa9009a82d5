//! Shared "fetch -> wrangle" logic used by both CLI and TUI front-ends.
//!
//! A fetch-and-wrangle cycle is one fallible unit: either both tables are
//! produced, or the caller gets an error and keeps whatever it had.

use tracing::info;

use crate::config::AppConfig;
use crate::data::{ApiSource, RecordSource, SnapshotSource};
use crate::domain::{Dataset, RawRecord};
use crate::error::AppError;
use crate::wrangle::{WrangledTable, wrangle};

/// One wrangled table per dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Tables {
    pub daily: WrangledTable,
    pub vaccinations: WrangledTable,
}

impl Tables {
    pub fn get(&self, dataset: Dataset) -> &WrangledTable {
        match dataset {
            Dataset::Daily => &self.daily,
            Dataset::Vaccinations => &self.vaccinations,
        }
    }
}

/// Wrangle both datasets from one record list.
pub fn wrangle_tables(records: &[RawRecord]) -> Result<Tables, AppError> {
    Ok(Tables {
        daily: wrangle(records, Dataset::Daily.columns())?,
        vaccinations: wrangle(records, Dataset::Vaccinations.columns())?,
    })
}

/// Fetch from `source` and wrangle both datasets.
///
/// The source is only told to commit (e.g. persist a snapshot) after both
/// tables wrangled cleanly.
pub fn fetch_tables(source: &dyn RecordSource) -> Result<Tables, AppError> {
    let records = source.fetch()?;
    if records.is_empty() {
        return Err(AppError::external(format!("No records returned from {}.", source.describe())));
    }
    let tables = wrangle_tables(&records)?;
    source.commit(&records);
    info!(
        source = %source.describe(),
        records = records.len(),
        days = tables.daily.len(),
        "wrangled tables"
    );
    Ok(tables)
}

/// Where startup data comes from: the snapshot if present (and `--live` was
/// not requested), the API otherwise.
pub fn startup_source(config: &AppConfig) -> Result<Box<dyn RecordSource>, AppError> {
    if !config.live && config.snapshot_path.exists() {
        return Ok(Box::new(SnapshotSource {
            path: config.snapshot_path.clone(),
        }));
    }
    Ok(Box::new(ApiSource::from_config(config)?))
}

/// Load the initial tables.
pub fn load_startup_tables(config: &AppConfig) -> Result<Tables, AppError> {
    let source = startup_source(config)?;
    fetch_tables(source.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{read_snapshot, write_snapshot};
    use std::path::PathBuf;

    struct Fixed(Vec<RawRecord>);

    impl RecordSource for Fixed {
        fn fetch(&self) -> Result<Vec<RawRecord>, AppError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    /// Serves fixed records and persists them on commit, like the live API source.
    struct Persisting {
        records: Vec<RawRecord>,
        path: PathBuf,
    }

    impl RecordSource for Persisting {
        fn fetch(&self) -> Result<Vec<RawRecord>, AppError> {
            Ok(self.records.clone())
        }

        fn describe(&self) -> String {
            "persisting".to_string()
        }

        fn commit(&self, records: &[RawRecord]) {
            write_snapshot(&self.path, records).unwrap();
        }
    }

    fn temp_snapshot(tag: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("covid-pipeline-{tag}-{}", std::process::id()))
            .join("snap.json")
    }

    #[test]
    fn both_tables_share_the_date_span() {
        let records = vec![
            RawRecord::new("2021-01-03").with("cases", 10).with("first dose", 1000),
            RawRecord::new("2021-01-01").with("deaths", 2),
        ];
        let tables = fetch_tables(&Fixed(records)).unwrap();
        assert_eq!(tables.daily.len(), 3);
        assert_eq!(tables.vaccinations.len(), 3);
        assert_eq!(tables.get(Dataset::Daily).columns().len(), 4);
        assert_eq!(tables.get(Dataset::Vaccinations).column("first dose").unwrap(), &[0.0, 0.0, 1000.0]);
    }

    #[test]
    fn empty_source_is_an_error_not_a_panic() {
        let err = fetch_tables(&Fixed(Vec::new())).unwrap_err();
        assert!(err.message().contains("No records"));
    }

    #[test]
    fn wrangle_failure_fails_the_whole_unit() {
        let records = vec![RawRecord::new("not a date").with("cases", 1)];
        let err = fetch_tables(&Fixed(records)).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn bad_records_leave_the_snapshot_untouched() {
        let path = temp_snapshot("bad");
        let good = vec![RawRecord::new("2021-01-01").with("cases", 7)];
        write_snapshot(&path, &good).unwrap();

        let source = Persisting {
            records: vec![RawRecord::new("not-a-date").with("cases", 1)],
            path: path.clone(),
        };
        let err = fetch_tables(&source).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(read_snapshot(&path).unwrap(), good);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn clean_records_are_committed() {
        let path = temp_snapshot("good");
        let records = vec![
            RawRecord::new("2021-01-02").with("cases", 3),
            RawRecord::new("2021-01-01").with("cases", 2),
        ];
        let source = Persisting {
            records: records.clone(),
            path: path.clone(),
        };
        fetch_tables(&source).unwrap();
        assert_eq!(read_snapshot(&path).unwrap(), records);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
