//! wr-ranking
//!
//! Runs the win-rate backtest across a watch-list and produces a leaderboard
//! sorted by overnight win rate. Tickers that cannot be fetched or that carry
//! too few samples are skipped, never fatal.
//!
//! The last computed leaderboard can be kept behind the [`RankingStore`]
//! port (CSV file or in-memory).

mod aggregator;
mod store;
mod types;

pub use aggregator::{load_or_refresh, rank_tickers, SnapshotSource};
pub use store::{CsvRankingStore, MemoryRankingStore, RankingStore, StoreError, CSV_COLUMNS};
pub use types::{
    parse_date_range_label, RankingConfig, RankingEntry, RankingKey, RankingRun, RankingSnapshot,
    SkipReason, WatchItem, DEFAULT_MIN_SAMPLE_COUNT, DEFAULT_TOP_N,
};
