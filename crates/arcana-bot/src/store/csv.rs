//! A directory of CSV files standing in for a spreadsheet.
//!
//! Each sheet is one `<Sheet>.csv` file with no special header handling:
//! row 1 of the file is row 1 of the sheet, so `Cards!A2:E` skips the
//! header line exactly as it would in a spreadsheet. Sheets created by an
//! append get the known header for that table.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use arcana_core::{RangeRef, Row, StoreError, StoreResult, TabularStore};

/// Header rows written when a sheet file is first created.
const HEADERS: &[(&str, &[&str])] = &[
    ("Cards", &["id", "name", "type", "meaning", "imageRef"]),
    ("Spreads", &["key", "positions"]),
    (
        "Readings",
        &[
            "timestamp",
            "requesterId",
            "question",
            "spreadName",
            "resultSummary",
        ],
    ),
];

/// Store backed by CSV files in one directory.
pub struct CsvStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CsvStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn sheet_path(&self, sheet: &str) -> StoreResult<PathBuf> {
        let valid = !sheet.is_empty()
            && sheet
                .chars()
                .all(|c| c.is_alphanumeric() || c == ' ' || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidRange(sheet.to_string()));
        }
        Ok(self.dir.join(format!("{sheet}.csv")))
    }
}

fn read_sheet(path: &Path) -> StoreResult<Vec<Row>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn append_to_sheet(path: &Path, sheet: &str, row: &[String]) -> StoreResult<()> {
    let is_new = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = writer(file);

    if is_new {
        if let Some((_, header)) = HEADERS.iter().find(|(name, _)| *name == sheet) {
            writer.write_record(*header).map_err(csv_error)?;
        }
    }
    writer.write_record(row).map_err(csv_error)?;
    writer.flush()?;
    Ok(())
}

fn writer(file: File) -> csv::Writer<File> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(file)
}

fn csv_error(e: csv::Error) -> StoreError {
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(io) => StoreError::Io(io),
            other => StoreError::Malformed(format!("{other:?}")),
        }
    } else {
        StoreError::Malformed(e.to_string())
    }
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    StoreError::Unavailable(format!("store task failed: {e}"))
}

#[async_trait]
impl TabularStore for CsvStore {
    async fn read_range(&self, range: &str) -> StoreResult<Vec<Row>> {
        let range = RangeRef::parse(range)?;
        let path = self.sheet_path(&range.sheet)?;
        let rows = tokio::task::spawn_blocking(move || read_sheet(&path))
            .await
            .map_err(join_error)??;
        Ok(range.slice(&rows))
    }

    async fn append_row(&self, range: &str, row: Row) -> StoreResult<()> {
        let range = RangeRef::parse(range)?;
        let path = self.sheet_path(&range.sheet)?;
        let _guard = self.write_lock.lock().await;
        debug!("appending row to {}", path.display());
        let sheet = range.sheet;
        tokio::task::spawn_blocking(move || append_to_sheet(&path, &sheet, &row))
            .await
            .map_err(join_error)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn reads_ranges_past_the_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cards.csv"),
            "id,name,type,meaning,imageRef\n0,The Fool,Major,\"New starts, leaps\",fool.png\n1,The Magician,Major,Skill,\n",
        )
        .unwrap();
        let store = CsvStore::open(dir.path()).unwrap();

        let rows = store.read_range("Cards!A2:E").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][3], "New starts, leaps");
        assert_eq!(rows[1], row(&["1", "The Magician", "Major", "Skill", ""]));
    }

    #[tokio::test]
    async fn missing_sheet_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        assert!(store.read_range("Readings!A2:E").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_creates_sheet_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        store
            .append_row("Readings!A2:E", row(&["2026-01-01T00:00:00Z", "u1", "Why?", "one", "x"]))
            .await
            .unwrap();
        store
            .append_row("Readings!A2:E", row(&["2026-01-02T00:00:00Z", "u2", "", "three", "y"]))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("Readings.csv")).unwrap();
        assert!(raw.starts_with("timestamp,requesterId,question,spreadName,resultSummary\n"));

        let rows = store.read_range("Readings!A2:E").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], "u2");
    }

    #[tokio::test]
    async fn rejects_path_like_sheet_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read_range("../etc!A1:B").await,
            Err(StoreError::InvalidRange(_))
        ));
    }
}
