//! `wr rank`: leaderboard over the watch-list.
//!
//! The configured watch-list is cached in the CSV ranking store and reused
//! until `--refresh`, until the date range moves, or until any ranking
//! parameter (provider, thresholds, filters, tickers) changes. An ad hoc `--tickers`
//! list is always computed fresh and never overwrites the cache.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use wr_backtest::BacktestConfig;
use wr_config::validate_threshold;
use wr_md::CachedProvider;
use wr_ranking::{
    load_or_refresh, rank_tickers, CsvRankingStore, MemoryRankingStore, RankingConfig,
    RankingKey, RankingSnapshot, RankingStore, SnapshotSource, WatchItem,
};

use super::{fetch_window, fmt_opt, load_config, price_provider};

pub struct RankArgs {
    pub config_paths: Vec<String>,
    pub provider: Option<String>,
    pub tickers: Option<String>,
    pub threshold: Option<f64>,
    pub three_day_threshold: Option<f64>,
    pub top_n: Option<usize>,
    pub min_samples: Option<usize>,
    pub cache_path: Option<PathBuf>,
    pub refresh: bool,
    pub as_of: Option<NaiveDate>,
}

/// Split `A, B,,C` into watch items, dropping blanks.
pub fn parse_tickers(raw: &str) -> Vec<WatchItem> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(WatchItem::new)
        .collect()
}

pub fn run_rank(args: RankArgs) -> Result<()> {
    let cfg = load_config(&args.config_paths)?;

    let (items, ad_hoc) = match args.tickers.as_deref() {
        Some(raw) => (parse_tickers(raw), true),
        None => (
            cfg.app
                .watchlist
                .iter()
                .map(|w| WatchItem {
                    ticker: w.ticker.clone(),
                    display_name: w.name.clone(),
                })
                .collect(),
            false,
        ),
    };
    if items.is_empty() {
        bail!("empty watch-list: pass --tickers or set `watchlist` in config");
    }

    let top_n = args.top_n.unwrap_or(cfg.app.ranking.top_n);
    if top_n == 0 {
        bail!("--top-n must be > 0");
    }

    let (start, end) = fetch_window(args.as_of, cfg.app.data.lookback_days)?;
    let mut ranking_cfg = RankingConfig::new(start, end);
    ranking_cfg.backtest = BacktestConfig {
        overnight_threshold_pct: validate_threshold(
            "--threshold",
            args.threshold
                .unwrap_or(cfg.app.backtest.overnight_threshold_pct),
        )?,
        three_day_threshold_pct: validate_threshold(
            "--three-day-threshold",
            args.three_day_threshold
                .unwrap_or(cfg.app.backtest.three_day_threshold_pct),
        )?,
    };
    ranking_cfg.min_sample_count = args.min_samples.unwrap_or(cfg.app.ranking.min_sample_count);
    ranking_cfg.top_n = top_n;
    ranking_cfg.min_overnight_win_rate = cfg.app.ranking.min_overnight_win_rate;

    let (kind, provider) = price_provider(&cfg, args.provider.as_deref())?;
    let provider = CachedProvider::new(provider);

    let store: Box<dyn RankingStore> = if ad_hoc {
        Box::new(MemoryRankingStore::new())
    } else {
        let path = args
            .cache_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&cfg.app.ranking.cache_path));
        Box::new(CsvRankingStore::new(path))
    };

    let key = RankingKey::new(&ranking_cfg, kind.as_str(), &items);
    let mut skipped = Vec::new();
    let (snapshot, source) = load_or_refresh(store.as_ref(), args.refresh, &key, || {
        let run = rank_tickers(&items, &provider, &ranking_cfg);
        skipped = run.skipped;
        RankingSnapshot::new(&ranking_cfg, key.params.clone(), run.entries)
    });

    let source = match source {
        SnapshotSource::Cache => "cache",
        SnapshotSource::Fresh => "fresh",
    };
    println!(
        "range={} provider={} source={} requested={} ranked={} skipped={}",
        snapshot.date_range_label,
        kind,
        source,
        items.len(),
        snapshot.entries.len(),
        skipped.len()
    );

    for (i, e) in snapshot.entries.iter().enumerate() {
        println!(
            "rank={} ticker={} name=\"{}\" overnight_win_rate={:.1} three_day_win_rate={:.1} \
             open_buy_win_rate={:.1} sample_count={} mean_overnight_change_pct={} data_as_of={}",
            i + 1,
            e.ticker,
            e.label(),
            e.overnight_win_rate,
            e.three_day_win_rate,
            e.open_buy_win_rate,
            e.sample_count,
            fmt_opt(e.mean_overnight_change_pct),
            e.data_as_of
                .map(|d| d.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
    }
    for (ticker, reason) in &skipped {
        println!("skipped ticker={} reason=\"{}\"", ticker, reason);
    }

    Ok(())
}
