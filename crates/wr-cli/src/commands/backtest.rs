//! `wr backtest`: single-ticker win-rate backtest.
//!
//! Degraded outcomes (provider unavailable, too little history) are printed
//! as `status=...` lines and exit 0; only bad arguments or config fail.

use anyhow::Result;
use chrono::NaiveDate;
use wr_backtest::{compute_backtest, BacktestConfig, BacktestRow};
use wr_config::validate_threshold;
use wr_md::FetchRequest;

use super::{fetch_window, load_config, price_provider};

pub struct BacktestArgs {
    pub ticker: String,
    pub config_paths: Vec<String>,
    pub provider: Option<String>,
    pub threshold: Option<f64>,
    pub three_day_threshold: Option<f64>,
    pub lookback_days: Option<u32>,
    pub rows: usize,
    pub as_of: Option<NaiveDate>,
}

pub fn run_backtest(args: BacktestArgs) -> Result<()> {
    let cfg = load_config(&args.config_paths)?;

    let bt_cfg = BacktestConfig {
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
    let lookback = args.lookback_days.unwrap_or(cfg.app.data.lookback_days);
    if lookback == 0 {
        anyhow::bail!("--lookback-days must be > 0");
    }
    let (start, end) = fetch_window(args.as_of, lookback)?;
    let (kind, provider) = price_provider(&cfg, args.provider.as_deref())?;

    println!(
        "ticker={} provider={} start={} end={}",
        args.ticker, kind, start, end
    );
    println!(
        "overnight_threshold_pct={} three_day_threshold_pct={} config_hash={}",
        bt_cfg.overnight_threshold_pct, bt_cfg.three_day_threshold_pct, cfg.loaded.config_hash
    );

    let req = FetchRequest::new(args.ticker.clone(), start, end);
    let series = match provider.fetch_price_history(&req) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(ticker = %args.ticker, provider = %kind, error = %e, "price history unavailable");
            println!("status=no_data reason=\"{}\"", e);
            return Ok(());
        }
    };

    let outcome = compute_backtest(&series, &bt_cfg);
    let s = &outcome.summary;
    if !s.has_samples() {
        println!(
            "status=insufficient_sample sample_count=0 sessions={}",
            series.len()
        );
        return Ok(());
    }

    println!("status=ok sessions={}", series.len());
    println!(
        "sample_count={} overnight_win_rate={:.1} three_day_win_rate={:.1} open_buy_win_rate={:.1}",
        s.sample_count, s.overnight_win_rate, s.three_day_win_rate, s.open_buy_win_rate
    );
    println!(
        "mean_overnight_change_pct={:.2} mean_three_day_change_pct={:.2} min_overnight_change_pct={:.2}",
        s.mean_overnight_change_pct, s.mean_three_day_change_pct, s.min_overnight_change_pct
    );

    for row in outcome.tail(args.rows) {
        println!("{}", format_row(row));
    }

    Ok(())
}

fn format_row(r: &BacktestRow) -> String {
    format!(
        "row date={} close={:.2} next_open={:.2} next_close={:.2} day3_close={:.2} \
         overnight_change_pct={:.2} three_day_change_pct={:.2} \
         overnight_win={} three_day_win={} open_buy_win={}",
        r.date,
        r.close,
        r.next_open,
        r.next_close,
        r.day3_close,
        r.overnight_change_pct,
        r.three_day_change_pct,
        r.is_overnight_win,
        r.is_three_day_win,
        r.is_open_buy_win
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_line_is_key_value() {
        let r = BacktestRow {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            close: 100.0,
            next_open: 102.0,
            next_close: 101.0,
            day3_close: 103.0,
            overnight_change_pct: 2.0,
            three_day_change_pct: 3.0,
            is_overnight_win: true,
            is_three_day_win: true,
            is_open_buy_win: false,
        };
        assert_eq!(
            format_row(&r),
            "row date=2024-03-01 close=100.00 next_open=102.00 next_close=101.00 day3_close=103.00 \
             overnight_change_pct=2.00 three_day_change_pct=3.00 \
             overnight_win=true three_day_win=true open_buy_win=false"
        );
    }
}
