//! Persistence port for the last computed leaderboard.
//!
//! The cache is best-effort: a missing, unreadable or malformed CSV loads as
//! `None` so callers fall back to a fresh computation.
//!
//! The CSV keeps the fixed leaderboard columns. The parameters the leaderboard
//! was computed with live in a one-line sidecar, `<file>.params`; a missing
//! sidecar loads as empty params, which never match a request.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{parse_date_range_label, RankingEntry, RankingSnapshot};

/// Column order of the CSV cache.
pub const CSV_COLUMNS: [&str; 8] = [
    "date_range_label",
    "display_name",
    "ticker",
    "overnight_win_rate",
    "sample_count",
    "three_day_win_rate",
    "open_buy_win_rate",
    "data_as_of",
];

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Csv(String),
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Csv(e.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "io error: {}", e),
            StoreError::Csv(e) => write!(f, "csv error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Load-last / store-latest port.
pub trait RankingStore {
    fn load_last(&self) -> Result<Option<RankingSnapshot>, StoreError>;

    /// Replace whatever was stored with `snapshot`.
    fn store_latest(&self, snapshot: &RankingSnapshot) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// CSV file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CsvRankingStore {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    date_range_label: String,
    display_name: Option<String>,
    ticker: String,
    overnight_win_rate: f64,
    sample_count: usize,
    three_day_win_rate: f64,
    open_buy_win_rate: f64,
    data_as_of: Option<NaiveDate>,
}

impl From<&RankingEntry> for CsvRow {
    fn from(e: &RankingEntry) -> Self {
        Self {
            date_range_label: e.date_range_label.clone(),
            display_name: e.display_name.clone(),
            ticker: e.ticker.clone(),
            overnight_win_rate: e.overnight_win_rate,
            sample_count: e.sample_count,
            three_day_win_rate: e.three_day_win_rate,
            open_buy_win_rate: e.open_buy_win_rate,
            data_as_of: e.data_as_of,
        }
    }
}

impl From<CsvRow> for RankingEntry {
    fn from(r: CsvRow) -> Self {
        Self {
            ticker: r.ticker,
            display_name: r.display_name.filter(|n| !n.is_empty()),
            date_range_label: r.date_range_label,
            data_as_of: r.data_as_of,
            sample_count: r.sample_count,
            overnight_win_rate: r.overnight_win_rate,
            three_day_win_rate: r.three_day_win_rate,
            open_buy_win_rate: r.open_buy_win_rate,
            mean_overnight_change_pct: None,
            mean_three_day_change_pct: None,
            min_overnight_change_pct: None,
        }
    }
}

impl CsvRankingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ranking.csv".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    pub fn params_path(&self) -> PathBuf {
        self.sibling(".params")
    }

    fn read_params(&self) -> Result<String, String> {
        match fs::read_to_string(self.params_path()) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(format!("params sidecar: {e}")),
        }
    }

    fn read_snapshot(&self) -> Result<Option<RankingSnapshot>, String> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| e.to_string())?;

        let headers = rdr.headers().map_err(|e| e.to_string())?;
        if !headers.iter().eq(CSV_COLUMNS) {
            return Err(format!("unexpected header: {:?}", headers));
        }

        let mut entries: Vec<RankingEntry> = Vec::new();
        for row in rdr.deserialize::<CsvRow>() {
            entries.push(row.map_err(|e| e.to_string())?.into());
        }

        // The label is the only place the range is recorded; a header-only file
        // cannot be matched against a request.
        let Some(label) = entries.first().map(|e| e.date_range_label.clone()) else {
            return Ok(None);
        };
        if entries.iter().any(|e| e.date_range_label != label) {
            return Err("mixed date range labels".to_string());
        }
        let (_, generated_on) =
            parse_date_range_label(&label).ok_or_else(|| format!("bad date range label: {label}"))?;

        Ok(Some(RankingSnapshot {
            date_range_label: label,
            params: self.read_params()?,
            generated_on,
            entries,
        }))
    }
}

impl RankingStore for CsvRankingStore {
    fn load_last(&self) -> Result<Option<RankingSnapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        match self.read_snapshot() {
            Ok(snapshot) => Ok(snapshot),
            Err(reason) => {
                tracing::warn!(path = %self.path.display(), reason = %reason, "ignoring unreadable ranking cache");
                Ok(None)
            }
        }
    }

    fn store_latest(&self, snapshot: &RankingSnapshot) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp = self.tmp_path();
        {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp)?;
            wtr.write_record(CSV_COLUMNS)?;
            for entry in &snapshot.entries {
                wtr.serialize(CsvRow::from(entry))?;
            }
            wtr.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        let params_tmp = self.sibling(".params.tmp");
        fs::write(&params_tmp, format!("{}\n", snapshot.params))?;
        fs::rename(&params_tmp, self.params_path())?;

        tracing::debug!(
            path = %self.path.display(),
            entries = snapshot.entries.len(),
            "ranking cache written"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryRankingStore {
    slot: Mutex<Option<RankingSnapshot>>,
}

impl MemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RankingSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }
}

impl RankingStore for MemoryRankingStore {
    fn load_last(&self) -> Result<Option<RankingSnapshot>, StoreError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn store_latest(&self, snapshot: &RankingSnapshot) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(())
    }
}
