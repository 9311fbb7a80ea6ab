//! Flat CSV table of collected records.
//!
//! The table is replaced wholesale on every save (write to a temp file in the
//! same directory, then rename) and read wholesale on load.

pub mod codec;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::models::Record;
use codec::{decode_ids, decode_names, encode_ids, encode_names};

/// Errors from the record table.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write table {}: {source}", path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read table {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Corrupt table {} at row {row}: {detail}", path.display())]
    CorruptTable {
        path: PathBuf,
        row: u64,
        detail: String,
    },
}

/// What a save call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { path: PathBuf, rows: usize },
    /// Nothing to write; the existing table was left alone.
    Skipped,
}

/// On-disk row. Column names match tables written by earlier versions.
#[derive(Debug, Serialize, Deserialize)]
struct RecordRow {
    id: i64,
    title: String,
    original_language: String,
    fetched_language_code: String,
    fetched_language_name: String,
    genre_ids: String,
    genres_list: String,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    release_date: String,
    overview: String,
}

impl RecordRow {
    fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            original_language: record.original_language.clone(),
            fetched_language_code: record.fetched_partition_code.clone(),
            fetched_language_name: record.fetched_partition_name.clone(),
            genre_ids: encode_ids(&record.category_ids),
            genres_list: encode_names(&record.category_names),
            popularity: Some(record.score),
            vote_average: Some(record.rating),
            release_date: record.release_date.clone(),
            overview: record.summary.clone(),
        }
    }

    fn into_record(self) -> Result<Record, String> {
        let category_ids = decode_ids(&self.genre_ids).map_err(|e| format!("genre_ids: {}", e))?;
        let category_names =
            decode_names(&self.genres_list).map_err(|e| format!("genres_list: {}", e))?;

        Ok(Record {
            id: self.id,
            title: self.title,
            original_language: self.original_language,
            fetched_partition_code: self.fetched_language_code,
            fetched_partition_name: self.fetched_language_name,
            category_ids,
            category_names,
            score: finite_or_zero(self.popularity),
            rating: finite_or_zero(self.vote_average),
            release_date: self.release_date,
            summary: self.overview,
        })
    }
}

/// Missing, NaN and infinite cells all read as 0.
fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Sole reader and writer of the persisted record table.
#[derive(Debug, Clone)]
pub struct TableStore {
    path: PathBuf,
}

impl TableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the table with `records`. Empty input writes nothing.
    pub fn save(&self, records: &[Record]) -> Result<SaveOutcome, StoreError> {
        if records.is_empty() {
            debug!("No records to save, leaving {} untouched", self.path.display());
            return Ok(SaveOutcome::Skipped);
        }

        self.write_atomically(records)
            .map_err(|source| StoreError::PersistFailed {
                path: self.path.clone(),
                source,
            })?;

        info!("Saved {} records to {}", records.len(), self.path.display());
        Ok(SaveOutcome::Written {
            path: self.path.clone(),
            rows: records.len(),
        })
    }

    fn write_atomically(&self, records: &[Record]) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            for record in records {
                writer
                    .serialize(RecordRow::from_record(record))
                    .map_err(io::Error::other)?;
            }
            writer.flush()?;
        }
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Load every record. `Ok(None)` means no table has been written yet.
    ///
    /// Any undecodable row fails the whole load.
    pub fn load(&self) -> Result<Option<Vec<Record>>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::ReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut reader = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for (i, row) in reader.deserialize::<RecordRow>().enumerate() {
            let row_number = i as u64 + 1;
            let record = row
                .map_err(|e| e.to_string())
                .and_then(RecordRow::into_record)
                .map_err(|detail| StoreError::CorruptTable {
                    path: self.path.clone(),
                    row: row_number,
                    detail,
                })?;
            records.push(record);
        }

        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(Some(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    fn store(dir: &tempfile::TempDir) -> TableStore {
        TableStore::new(dir.path().join("data").join("movies.csv"))
    }

    #[test]
    fn test_load_without_table_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store(&dir).load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let mut records = vec![
            record(3, "en", &["Action", "Drama"], 12.75),
            record(1, "fr", &[], 0.0),
            record(2, "hi", &["Unknown"], 1e-3),
        ];
        records[1].summary = "line one\nline two, \"quoted\"".to_string();
        records[2].title = String::new();

        let outcome = store.save(&records).unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Written {
                path: store.path().to_path_buf(),
                rows: 3
            }
        );
        assert_eq!(store.load().unwrap().unwrap(), records);
    }

    #[test]
    fn test_save_empty_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert_eq!(store.save(&[]).unwrap(), SaveOutcome::Skipped);
        assert!(!store.exists());

        store.save(&[record(1, "en", &["Action"], 1.0)]).unwrap();
        assert_eq!(store.save(&[]).unwrap(), SaveOutcome::Skipped);
        assert_eq!(store.load().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_save_replaces_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .save(&[record(1, "en", &["Action"], 1.0), record(2, "en", &["Action"], 2.0)])
            .unwrap();
        store.save(&[record(9, "fr", &["Drama"], 9.0)]).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 9);

        let leftovers: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_header_uses_table_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&[record(1, "en", &["Action"], 1.0)]).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with(
            "id,title,original_language,fetched_language_code,fetched_language_name,\
             genre_ids,genres_list,popularity,vote_average,release_date,overview\n"
        ));
        assert!(text.contains("\"[\"\"Action\"\"]\""));
    }

    #[test]
    fn test_corrupt_list_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "id,title,original_language,fetched_language_code,fetched_language_name,genre_ids,genres_list,popularity,vote_average,release_date,overview\n\
             1,Good,en,en,English,[28],['Action'],5.0,7.0,2020-01-01,fine\n\
             2,Bad,en,en,English,[28],Action,5.0,7.0,2020-01-01,broken\n",
        )
        .unwrap();

        match store.load() {
            Err(StoreError::CorruptTable { row, detail, .. }) => {
                assert_eq!(row, 2);
                assert!(detail.starts_with("genres_list"));
            }
            other => panic!("expected CorruptTable, got {:?}", other),
        }
    }

    #[test]
    fn test_loads_table_from_earlier_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "id,title,original_language,fetched_language_code,fetched_language_name,genre_ids,genres_list,popularity,vote_average,release_date,overview\n\
             550,Fight Club,en,en,English,\"[18, 53]\",\"['Drama', 'Thriller']\",61.4,8.4,1999-10-15,\"Soap, mostly.\"\n\
             551,No Score,en,en,English,[],[],,,,\n",
        )
        .unwrap();

        let records = store.load().unwrap().unwrap();
        assert_eq!(records[0].category_ids, vec![18, 53]);
        assert_eq!(records[0].category_names, vec!["Drama", "Thriller"]);
        assert_eq!(records[0].summary, "Soap, mostly.");
        assert_eq!(records[1].score, 0.0);
        assert_eq!(records[1].rating, 0.0);
        assert!(records[1].category_names.is_empty());
    }

    #[test]
    fn test_failed_save_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let original = vec![record(1, "en", &["Action"], 1.0)];
        store.save(&original).unwrap();

        // The existing table file stands where a directory is needed.
        let blocked = TableStore::new(store.path().join("nested.csv"));
        match blocked.save(&[record(2, "fr", &["Drama"], 2.0)]) {
            Err(StoreError::PersistFailed { path, .. }) => assert_eq!(path, blocked.path()),
            other => panic!("expected PersistFailed, got {:?}", other),
        }

        assert_eq!(store.load().unwrap().unwrap(), original);
        let entries: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_non_finite_numbers_load_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "id,title,original_language,fetched_language_code,fetched_language_name,genre_ids,genres_list,popularity,vote_average,release_date,overview\n\
             1,Odd,en,en,English,[28],['Action'],NaN,inf,,\n\
             2,Plain,en,en,English,[28],['Action'],0.5,6.0,,\n",
        )
        .unwrap();

        let records = store.load().unwrap().unwrap();
        assert_eq!(records[0].score, 0.0);
        assert_eq!(records[0].rating, 0.0);

        let ranked: Vec<i64> = crate::query::query(&records, "en", "Action")
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ranked, vec![2, 1]);
    }

    #[test]
    fn test_non_numeric_id_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "id,title,original_language,fetched_language_code,fetched_language_name,genre_ids,genres_list,popularity,vote_average,release_date,overview\n\
             abc,X,en,en,English,[],[],1,1,,\n",
        )
        .unwrap();

        assert!(matches!(
            store.load(),
            Err(StoreError::CorruptTable { row: 1, .. })
        ));
    }
}
