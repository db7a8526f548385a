use chrono::NaiveDate;

/// Default overnight win threshold, percentage points.
pub const DEFAULT_OVERNIGHT_THRESHOLD_PCT: f64 = 1.5;

/// Default three-day win threshold, percentage points.
pub const DEFAULT_THREE_DAY_THRESHOLD_PCT: f64 = 2.5;

/// Win thresholds, both in percentage points and compared inclusively.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BacktestConfig {
    pub overnight_threshold_pct: f64,
    pub three_day_threshold_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            overnight_threshold_pct: DEFAULT_OVERNIGHT_THRESHOLD_PCT,
            three_day_threshold_pct: DEFAULT_THREE_DAY_THRESHOLD_PCT,
        }
    }
}

impl BacktestConfig {
    /// Default three-day threshold with the given overnight threshold.
    pub fn with_overnight(overnight_threshold_pct: f64) -> Self {
        Self {
            overnight_threshold_pct,
            ..Self::default()
        }
    }
}

/// Labeled outcome for one session `i` (requires sessions `i+1` and `i+2`).
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestRow {
    /// Date of session `i`.
    pub date: NaiveDate,
    /// `close[i]`
    pub close: f64,
    /// `open[i+1]`
    pub next_open: f64,
    /// `close[i+1]`
    pub next_close: f64,
    /// `close[i+2]`
    pub day3_close: f64,
    pub overnight_change_pct: f64,
    pub three_day_change_pct: f64,
    pub is_overnight_win: bool,
    pub is_three_day_win: bool,
    /// Buying at `open[i+1]` and selling at `close[i+1]` gained.
    pub is_open_buy_win: bool,
}

/// Aggregate statistics over the valid rows.
///
/// With `sample_count == 0` every rate, mean and minimum is `0.0`; callers
/// must check [`BacktestSummary::has_samples`] before presenting them.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestSummary {
    pub sample_count: usize,
    /// Percent, rounded to one decimal place.
    pub overnight_win_rate: f64,
    /// Percent, rounded to one decimal place.
    pub three_day_win_rate: f64,
    /// Percent, rounded to one decimal place.
    pub open_buy_win_rate: f64,
    pub mean_overnight_change_pct: f64,
    pub mean_three_day_change_pct: f64,
    pub min_overnight_change_pct: f64,
}

impl BacktestSummary {
    pub fn empty() -> Self {
        Self {
            sample_count: 0,
            overnight_win_rate: 0.0,
            three_day_win_rate: 0.0,
            open_buy_win_rate: 0.0,
            mean_overnight_change_pct: 0.0,
            mean_three_day_change_pct: 0.0,
            min_overnight_change_pct: 0.0,
        }
    }

    pub fn has_samples(&self) -> bool {
        self.sample_count > 0
    }

    /// `Err(InsufficientSample)` when fewer than `min` valid rows back the rates.
    pub fn require_min_samples(&self, min: usize) -> Result<&Self, BacktestError> {
        if self.sample_count < min.max(1) {
            return Err(BacktestError::InsufficientSample {
                sample_count: self.sample_count,
                required: min.max(1),
            });
        }
        Ok(self)
    }
}

/// Rows plus their summary, as produced by one backtest pass.
#[derive(Clone, Debug, PartialEq)]
pub struct BacktestOutcome {
    pub rows: Vec<BacktestRow>,
    pub summary: BacktestSummary,
}

impl BacktestOutcome {
    /// The last `n` rows (all rows if fewer).
    pub fn tail(&self, n: usize) -> &[BacktestRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }
}

/// Backtest error variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BacktestError {
    /// Too few valid rows for the rates to mean anything.
    InsufficientSample { sample_count: usize, required: usize },
}

impl core::fmt::Display for BacktestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BacktestError::InsufficientSample {
                sample_count,
                required,
            } => write!(
                f,
                "insufficient sample: {} valid rows, need at least {}",
                sample_count, required
            ),
        }
    }
}

impl std::error::Error for BacktestError {}
