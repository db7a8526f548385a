//! wr-backtest
//!
//! Win-rate backtest over a normalized daily series.
//!
//! For every session `i` with two sessions of future data it derives:
//! - overnight change: `close[i]` -> `open[i+1]`
//! - three-day change: `close[i]` -> `close[i+2]`
//! - open-buy outcome: `open[i+1]` -> `close[i+1]`
//!
//! and classifies each against inclusive (`>=`) thresholds. Summary rates are
//! empirical frequencies over the valid rows.
//!
//! - Pure: same series + config => bit-identical output
//! - No lookahead fabrication: the trailing two sessions produce no row
//! - No I/O, no logging

mod engine;
pub mod types;

pub use engine::{compute_backtest, pct_change, summarize};
pub use types::{
    BacktestConfig, BacktestError, BacktestOutcome, BacktestRow, BacktestSummary,
    DEFAULT_OVERNIGHT_THRESHOLD_PCT, DEFAULT_THREE_DAY_THRESHOLD_PCT,
};
