use chrono::NaiveDate;
use wr_backtest::{BacktestConfig, BacktestSummary};

pub const DEFAULT_MIN_SAMPLE_COUNT: usize = 10;
pub const DEFAULT_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One watch-list member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchItem {
    pub ticker: String,
    pub display_name: Option<String>,
}

impl WatchItem {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            display_name: None,
        }
    }

    pub fn named(ticker: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            display_name: Some(display_name.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankingConfig {
    pub backtest: BacktestConfig,
    /// Tickers with fewer valid rows are skipped. Zero rows are always skipped.
    pub min_sample_count: usize,
    /// Leaderboard length after sorting.
    pub top_n: usize,
    /// Optional floor on overnight win rate (percent); strictly lower entries are skipped.
    pub min_overnight_win_rate: Option<f64>,
    /// Inclusive fetch window.
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RankingConfig {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            backtest: BacktestConfig::default(),
            min_sample_count: DEFAULT_MIN_SAMPLE_COUNT,
            top_n: DEFAULT_TOP_N,
            min_overnight_win_rate: None,
            start,
            end,
        }
    }

    /// `YYYY-MM-DD~YYYY-MM-DD`
    pub fn date_range_label(&self) -> String {
        format!(
            "{}~{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Parse a `YYYY-MM-DD~YYYY-MM-DD` label back into its bounds.
pub fn parse_date_range_label(label: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (start, end) = label.trim().split_once('~')?;
    let start = NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d").ok()?;
    Some((start, end))
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// One leaderboard line.
///
/// Means and the minimum are `None` when the entry was read back from a
/// cache that does not persist them.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingEntry {
    pub ticker: String,
    pub display_name: Option<String>,
    pub date_range_label: String,
    /// Last session of the series the entry was computed from.
    pub data_as_of: Option<NaiveDate>,
    pub sample_count: usize,
    pub overnight_win_rate: f64,
    pub three_day_win_rate: f64,
    pub open_buy_win_rate: f64,
    pub mean_overnight_change_pct: Option<f64>,
    pub mean_three_day_change_pct: Option<f64>,
    pub min_overnight_change_pct: Option<f64>,
}

impl RankingEntry {
    pub fn from_summary(
        item: &WatchItem,
        date_range_label: impl Into<String>,
        data_as_of: Option<NaiveDate>,
        summary: &BacktestSummary,
    ) -> Self {
        Self {
            ticker: item.ticker.clone(),
            display_name: item.display_name.clone(),
            date_range_label: date_range_label.into(),
            data_as_of,
            sample_count: summary.sample_count,
            overnight_win_rate: summary.overnight_win_rate,
            three_day_win_rate: summary.three_day_win_rate,
            open_buy_win_rate: summary.open_buy_win_rate,
            mean_overnight_change_pct: Some(summary.mean_overnight_change_pct),
            mean_three_day_change_pct: Some(summary.mean_three_day_change_pct),
            min_overnight_change_pct: Some(summary.min_overnight_change_pct),
        }
    }

    /// Display name, falling back to the ticker.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.ticker)
    }
}

/// Why a ticker produced no entry.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// Fetch failed; carries the provider error text.
    Unavailable(String),
    InsufficientSample { sample_count: usize, required: usize },
    BelowMinWinRate { rate: f64, min: f64 },
}

impl core::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SkipReason::Unavailable(e) => write!(f, "unavailable: {}", e),
            SkipReason::InsufficientSample {
                sample_count,
                required,
            } => write!(f, "insufficient sample: {} < {}", sample_count, required),
            SkipReason::BelowMinWinRate { rate, min } => {
                write!(f, "overnight win rate {:.1} below minimum {:.1}", rate, min)
            }
        }
    }
}

/// Result of one batch pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingRun {
    /// Sorted by overnight win rate descending, truncated to `top_n`.
    pub entries: Vec<RankingEntry>,
    /// In input order.
    pub skipped: Vec<(String, SkipReason)>,
}

/// Identifies the inputs a leaderboard was computed from.
///
/// `params` covers everything besides the window that changes the result:
/// provider, thresholds, filters, `top_n` and the ticker list in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankingKey {
    pub date_range_label: String,
    pub params: String,
}

impl RankingKey {
    pub fn new(config: &RankingConfig, provider: &str, items: &[WatchItem]) -> Self {
        let min_rate = config
            .min_overnight_win_rate
            .map(|r| r.to_string())
            .unwrap_or_else(|| "none".to_string());
        let tickers: Vec<&str> = items.iter().map(|i| i.ticker.as_str()).collect();
        let params = format!(
            "provider={} overnight_threshold_pct={} three_day_threshold_pct={} \
             min_sample_count={} top_n={} min_overnight_win_rate={} tickers={}",
            provider,
            config.backtest.overnight_threshold_pct,
            config.backtest.three_day_threshold_pct,
            config.min_sample_count,
            config.top_n,
            min_rate,
            tickers.join(",")
        );
        Self {
            date_range_label: config.date_range_label(),
            params,
        }
    }
}

/// A persisted leaderboard.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingSnapshot {
    pub date_range_label: String,
    /// [`RankingKey::params`] of the run that produced it. Empty when unknown.
    pub params: String,
    /// End of the range the leaderboard was computed for.
    pub generated_on: NaiveDate,
    pub entries: Vec<RankingEntry>,
}

impl RankingSnapshot {
    pub fn new(config: &RankingConfig, params: impl Into<String>, entries: Vec<RankingEntry>) -> Self {
        Self {
            date_range_label: config.date_range_label(),
            params: params.into(),
            generated_on: config.end,
            entries,
        }
    }

    /// Same window and same parameters.
    pub fn matches(&self, key: &RankingKey) -> bool {
        self.date_range_label == key.date_range_label && self.params == key.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_range_label_format() {
        let cfg = RankingConfig::new(d(2024, 1, 5), d(2024, 7, 3));
        assert_eq!(cfg.date_range_label(), "2024-01-05~2024-07-03");
        assert_eq!(
            parse_date_range_label(&cfg.date_range_label()),
            Some((d(2024, 1, 5), d(2024, 7, 3)))
        );
    }

    #[test]
    fn bad_labels_do_not_parse() {
        assert_eq!(parse_date_range_label("2024-01-05"), None);
        assert_eq!(parse_date_range_label("2024-01-05~later"), None);
        assert_eq!(parse_date_range_label(""), None);
    }

    #[test]
    fn defaults() {
        let cfg = RankingConfig::new(d(2024, 1, 1), d(2024, 2, 1));
        assert_eq!(cfg.min_sample_count, 10);
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.min_overnight_win_rate, None);
        assert_eq!(cfg.backtest, BacktestConfig::default());
    }

    #[test]
    fn key_changes_with_every_ranking_parameter() {
        let items = [WatchItem::new("BBB"), WatchItem::named("AAA", "A Co")];
        let base_cfg = RankingConfig::new(d(2024, 1, 1), d(2024, 2, 1));
        let base = RankingKey::new(&base_cfg, "yahoo", &items);
        assert_eq!(base.date_range_label, "2024-01-01~2024-02-01");
        assert_eq!(
            base.params,
            "provider=yahoo overnight_threshold_pct=1.5 three_day_threshold_pct=2.5 \
             min_sample_count=10 top_n=10 min_overnight_win_rate=none tickers=BBB,AAA"
        );
        assert_eq!(base, RankingKey::new(&base_cfg, "yahoo", &items));

        let mut variants = Vec::new();
        let mut c = base_cfg.clone();
        c.backtest.overnight_threshold_pct = 5.0;
        variants.push(RankingKey::new(&c, "yahoo", &items));
        let mut c = base_cfg.clone();
        c.backtest.three_day_threshold_pct = 3.0;
        variants.push(RankingKey::new(&c, "yahoo", &items));
        let mut c = base_cfg.clone();
        c.min_sample_count = 100;
        variants.push(RankingKey::new(&c, "yahoo", &items));
        let mut c = base_cfg.clone();
        c.top_n = 1;
        variants.push(RankingKey::new(&c, "yahoo", &items));
        let mut c = base_cfg.clone();
        c.min_overnight_win_rate = Some(50.0);
        variants.push(RankingKey::new(&c, "yahoo", &items));
        variants.push(RankingKey::new(&base_cfg, "finmind", &items));
        variants.push(RankingKey::new(&base_cfg, "yahoo", &items[..1]));

        for v in &variants {
            assert_eq!(v.date_range_label, base.date_range_label);
            assert_ne!(v.params, base.params);
        }
    }

    #[test]
    fn snapshot_matches_only_its_own_key() {
        let cfg = RankingConfig::new(d(2024, 1, 1), d(2024, 2, 1));
        let key = RankingKey::new(&cfg, "yahoo", &[WatchItem::new("AAA")]);
        let snap = RankingSnapshot::new(&cfg, key.params.clone(), Vec::new());
        assert!(snap.matches(&key));

        let unknown = RankingSnapshot::new(&cfg, "", Vec::new());
        assert!(!unknown.matches(&key));
    }

    #[test]
    fn label_falls_back_to_ticker() {
        let s = BacktestSummary::empty();
        let e = RankingEntry::from_summary(&WatchItem::new("2330"), "x", None, &s);
        assert_eq!(e.label(), "2330");
        let e = RankingEntry::from_summary(&WatchItem::named("2330", "TSMC"), "x", None, &s);
        assert_eq!(e.label(), "TSMC");
    }
}
