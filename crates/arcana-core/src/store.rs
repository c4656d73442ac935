//! Tabular store abstraction.
//!
//! Cards, spreads and readings live in an external spreadsheet-like store.
//! Ranges use A1 notation (`Cards!A2:E`), which [`RangeRef`] parses so that
//! local backends can slice their rows the same way a spreadsheet would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};

/// A row of cells. Empty cells are empty strings.
pub type Row = Vec<String>;

/// Read and append rows in named ranges.
///
/// Implementations must be `Send + Sync` so one store can be shared by the
/// catalog, the reading engine and background persistence tasks.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Read every row in `range`, in order.
    async fn read_range(&self, range: &str) -> StoreResult<Vec<Row>>;

    /// Append one row after the last row of `range`'s sheet.
    async fn append_row(&self, range: &str, row: Row) -> StoreResult<()>;
}

/// A parsed A1-notation range such as `Cards!A2:E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRef {
    /// Sheet name before the `!`.
    pub sheet: String,
    /// Zero-based first column.
    pub first_col: usize,
    /// Zero-based first row.
    pub first_row: usize,
    /// Zero-based last column (inclusive), if bounded.
    pub last_col: Option<usize>,
    /// Zero-based last row (inclusive), if bounded.
    pub last_row: Option<usize>,
}

impl RangeRef {
    /// Parse `Sheet`, `Sheet!A2:E`, `Sheet!A:E` or `Sheet!B3:D10`.
    pub fn parse(range: &str) -> StoreResult<Self> {
        let invalid = || StoreError::InvalidRange(range.to_string());

        let (sheet, cells) = match range.split_once('!') {
            Some((sheet, cells)) => (sheet, Some(cells)),
            None => (range, None),
        };
        let sheet = sheet.trim().trim_matches('\'');
        if sheet.is_empty() {
            return Err(invalid());
        }

        let mut parsed = Self {
            sheet: sheet.to_string(),
            first_col: 0,
            first_row: 0,
            last_col: None,
            last_row: None,
        };

        if let Some(cells) = cells {
            let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
            let (col, row) = parse_cell(start).ok_or_else(invalid)?;
            parsed.first_col = col.unwrap_or(0);
            parsed.first_row = row.unwrap_or(0);
            let (col, row) = parse_cell(end).ok_or_else(invalid)?;
            parsed.last_col = col;
            parsed.last_row = row;
        }

        Ok(parsed)
    }

    /// Slice a sheet's rows down to this range.
    pub fn slice(&self, rows: &[Row]) -> Vec<Row> {
        let last_row = self.last_row.map(|r| r + 1).unwrap_or(usize::MAX);
        rows.iter()
            .enumerate()
            .filter(|(i, _)| *i >= self.first_row && *i < last_row)
            .map(|(_, row)| {
                let end = self
                    .last_col
                    .map(|c| (c + 1).min(row.len()))
                    .unwrap_or(row.len());
                row.get(self.first_col..end)
                    .map(|cells| cells.to_vec())
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Parse a cell reference like `A2`, `AA`, or `17` into zero-based (col, row).
fn parse_cell(cell: &str) -> Option<(Option<usize>, Option<usize>)> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    let split = cell
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);

    let col = if letters.is_empty() {
        None
    } else {
        let mut n = 0usize;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            n = n * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
        }
        Some(n - 1)
    };

    let row = if digits.is_empty() {
        None
    } else {
        let n: usize = digits.parse().ok()?;
        Some(n.checked_sub(1)?)
    };

    Some((col, row))
}

/// In-memory store, used for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: Mutex<HashMap<String, Vec<Row>>>,
    fail_reads: AtomicBool,
    fail_appends: AtomicBool,
    appends: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows of a sheet.
    pub async fn set_sheet(&self, sheet: &str, rows: Vec<Row>) {
        self.sheets.lock().await.insert(sheet.to_string(), rows);
    }

    /// Current rows of a sheet.
    pub async fn sheet(&self, sheet: &str) -> Vec<Row> {
        self.sheets
            .lock()
            .await
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every read fail with [`StoreError::Unavailable`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every append fail with [`StoreError::Unavailable`].
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of append calls received, including failed ones.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn read_range(&self, range: &str) -> StoreResult<Vec<Row>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        let range = RangeRef::parse(range)?;
        let sheets = self.sheets.lock().await;
        Ok(sheets
            .get(&range.sheet)
            .map(|rows| range.slice(rows))
            .unwrap_or_default())
    }

    async fn append_row(&self, range: &str, row: Row) -> StoreResult<()> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("appends disabled".to_string()));
        }
        let range = RangeRef::parse(range)?;
        self.sheets
            .lock()
            .await
            .entry(range.sheet)
            .or_default()
            .push(row);
        Ok(())
    }
}
