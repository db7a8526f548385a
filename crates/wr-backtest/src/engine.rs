use wr_md::{PricePoint, PriceSeries};

use crate::types::{BacktestConfig, BacktestOutcome, BacktestRow, BacktestSummary};

// ============================================================================
// Public API
// ============================================================================

/// Run the win-rate backtest over a normalized series.
///
/// Produces `len - 2` rows (none for fewer than three sessions). Thresholds
/// compare inclusively: a change exactly equal to the threshold is a win.
pub fn compute_backtest(series: &PriceSeries, config: &BacktestConfig) -> BacktestOutcome {
    let rows: Vec<BacktestRow> = series
        .points()
        .windows(3)
        .map(|w| label_row(&w[0], &w[1], &w[2], config))
        .collect();

    let summary = summarize(&rows);
    BacktestOutcome { rows, summary }
}

/// Aggregate rows into rates (percent, one decimal), means and the minimum
/// overnight change. No rows => [`BacktestSummary::empty`].
pub fn summarize(rows: &[BacktestRow]) -> BacktestSummary {
    if rows.is_empty() {
        return BacktestSummary::empty();
    }

    let n = rows.len() as f64;
    let count = |pred: fn(&BacktestRow) -> bool| rows.iter().filter(|r| pred(r)).count() as f64;

    let overnight_wins = count(|r| r.is_overnight_win);
    let three_day_wins = count(|r| r.is_three_day_win);
    let open_buy_wins = count(|r| r.is_open_buy_win);

    let sum_overnight: f64 = rows.iter().map(|r| r.overnight_change_pct).sum();
    let sum_three_day: f64 = rows.iter().map(|r| r.three_day_change_pct).sum();
    let min_overnight = rows
        .iter()
        .map(|r| r.overnight_change_pct)
        .fold(f64::INFINITY, f64::min);

    BacktestSummary {
        sample_count: rows.len(),
        overnight_win_rate: round1(overnight_wins / n * 100.0),
        three_day_win_rate: round1(three_day_wins / n * 100.0),
        open_buy_win_rate: round1(open_buy_wins / n * 100.0),
        mean_overnight_change_pct: sum_overnight / n,
        mean_three_day_change_pct: sum_three_day / n,
        min_overnight_change_pct: min_overnight,
    }
}

/// Percentage change from `from` to `to`. Caller guarantees `from > 0`.
pub fn pct_change(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}

// ============================================================================
// Internals
// ============================================================================

fn label_row(
    day: &PricePoint,
    next: &PricePoint,
    day3: &PricePoint,
    config: &BacktestConfig,
) -> BacktestRow {
    let overnight_change_pct = pct_change(day.close, next.open);
    let three_day_change_pct = pct_change(day.close, day3.close);

    BacktestRow {
        date: day.date,
        close: day.close,
        next_open: next.open,
        next_close: next.close,
        day3_close: day3.close,
        overnight_change_pct,
        three_day_change_pct,
        is_overnight_win: overnight_change_pct >= config.overnight_threshold_pct,
        is_three_day_win: three_day_change_pct >= config.three_day_threshold_pct,
        is_open_buy_win: next.close > next.open,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
