use wr_backtest::{compute_backtest, BacktestError};
use wr_md::{FetchRequest, PriceProvider};

use crate::store::RankingStore;
use crate::types::{
    RankingConfig, RankingEntry, RankingKey, RankingRun, RankingSnapshot, SkipReason, WatchItem,
};

/// Where a snapshot returned by [`load_or_refresh`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotSource {
    Cache,
    Fresh,
}

/// Backtest every watch-list item and build the leaderboard.
///
/// Items are processed sequentially in input order. Ties on overnight win
/// rate keep input order (stable sort). A failing item is recorded in
/// `skipped` and never aborts the batch.
pub fn rank_tickers(
    items: &[WatchItem],
    provider: &dyn PriceProvider,
    config: &RankingConfig,
) -> RankingRun {
    let label = config.date_range_label();
    let mut entries = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for item in items {
        match rank_one(item, provider, config, &label) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                tracing::warn!(ticker = %item.ticker, reason = %reason, "ticker skipped");
                skipped.push((item.ticker.clone(), reason));
            }
        }
    }

    entries.sort_by(|a, b| b.overnight_win_rate.total_cmp(&a.overnight_win_rate));
    entries.truncate(config.top_n);

    tracing::info!(
        provider = provider.name(),
        range = %label,
        requested = items.len(),
        ranked = entries.len(),
        skipped = skipped.len(),
        "ranking complete"
    );

    RankingRun { entries, skipped }
}

fn rank_one(
    item: &WatchItem,
    provider: &dyn PriceProvider,
    config: &RankingConfig,
    label: &str,
) -> Result<RankingEntry, SkipReason> {
    let req = FetchRequest::new(item.ticker.clone(), config.start, config.end);
    let series = provider
        .fetch_price_history(&req)
        .map_err(|e| SkipReason::Unavailable(e.to_string()))?;

    let outcome = compute_backtest(&series, &config.backtest);
    let summary = &outcome.summary;

    summary
        .require_min_samples(config.min_sample_count)
        .map_err(|e| match e {
            BacktestError::InsufficientSample {
                sample_count,
                required,
            } => SkipReason::InsufficientSample {
                sample_count,
                required,
            },
        })?;

    if let Some(min) = config.min_overnight_win_rate {
        if summary.overnight_win_rate < min {
            return Err(SkipReason::BelowMinWinRate {
                rate: summary.overnight_win_rate,
                min,
            });
        }
    }

    Ok(RankingEntry::from_summary(
        item,
        label,
        series.last_date(),
        summary,
    ))
}

/// Return the stored leaderboard for `expected`, or compute and store a fresh
/// one.
///
/// The stored snapshot is used only when `refresh` is false and it was
/// computed for the same window and parameters; a stale, missing or
/// unreadable snapshot falls back to `compute`. Failing to store the fresh
/// snapshot is logged and otherwise ignored.
pub fn load_or_refresh<F>(
    store: &dyn RankingStore,
    refresh: bool,
    expected: &RankingKey,
    compute: F,
) -> (RankingSnapshot, SnapshotSource)
where
    F: FnOnce() -> RankingSnapshot,
{
    if !refresh {
        match store.load_last() {
            Ok(Some(snapshot)) if snapshot.matches(expected) => {
                tracing::debug!(range = %expected.date_range_label, "using stored ranking");
                return (snapshot, SnapshotSource::Cache);
            }
            Ok(Some(snapshot)) => {
                tracing::info!(
                    stored_range = %snapshot.date_range_label,
                    stored_params = %snapshot.params,
                    expected_range = %expected.date_range_label,
                    expected_params = %expected.params,
                    "stored ranking is stale"
                );
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "stored ranking unreadable"),
        }
    }

    let snapshot = compute();
    if let Err(e) = store.store_latest(&snapshot) {
        tracing::warn!(error = %e, "failed to store ranking");
    }
    (snapshot, SnapshotSource::Fresh)
}
