use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

mod commands;

use commands::backtest::{run_backtest, BacktestArgs};
use commands::fundamentals::run_fundamentals;
use commands::rank::{run_rank, RankArgs};

#[derive(Parser)]
#[command(name = "wr")]
#[command(about = "Stock win-rate backtesting CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overnight / three-day win-rate backtest for one ticker
    Backtest {
        #[arg(long)]
        ticker: String,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// finmind | yahoo | twelvedata (overrides config)
        #[arg(long)]
        provider: Option<String>,

        /// Overnight win threshold, percent (0.5..=5.0)
        #[arg(long)]
        threshold: Option<f64>,

        /// Three-day win threshold, percent (0.5..=5.0)
        #[arg(long)]
        three_day_threshold: Option<f64>,

        /// Calendar days of history ending at --as-of
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Number of trailing rows to print
        #[arg(long, default_value_t = 20)]
        rows: usize,

        /// End of the fetch window (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Rank the watch-list by overnight win rate
    Rank {
        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long)]
        provider: Option<String>,

        /// Comma-separated tickers; replaces the configured watch-list
        #[arg(long)]
        tickers: Option<String>,

        /// Overnight win threshold, percent (0.5..=5.0)
        #[arg(long)]
        threshold: Option<f64>,

        /// Three-day win threshold, percent (0.5..=5.0)
        #[arg(long)]
        three_day_threshold: Option<f64>,

        #[arg(long)]
        top_n: Option<usize>,

        /// Minimum valid rows for a ticker to be ranked
        #[arg(long)]
        min_samples: Option<usize>,

        /// Ranking cache file (overrides ranking.cache_path)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Ignore the cached ranking and recompute
        #[arg(long, default_value_t = false)]
        refresh: bool,

        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Latest EPS and dividend yield for one ticker
    Fundamentals {
        #[arg(long)]
        ticker: String,

        #[arg(long = "config")]
        config_paths: Vec<String>,

        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> local overrides ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Dev-time convenience: pick up credentials from .env.local if present.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Backtest {
            ticker,
            config_paths,
            provider,
            threshold,
            three_day_threshold,
            lookback_days,
            rows,
            as_of,
        } => run_backtest(BacktestArgs {
            ticker,
            config_paths,
            provider,
            threshold,
            three_day_threshold,
            lookback_days,
            rows,
            as_of,
        })?,

        Commands::Rank {
            config_paths,
            provider,
            tickers,
            threshold,
            three_day_threshold,
            top_n,
            min_samples,
            cache,
            refresh,
            as_of,
        } => run_rank(RankArgs {
            config_paths,
            provider,
            tickers,
            threshold,
            three_day_threshold,
            top_n,
            min_samples,
            cache_path: cache,
            refresh,
            as_of,
        })?,

        Commands::Fundamentals {
            ticker,
            config_paths,
            as_of,
        } => run_fundamentals(ticker, config_paths, as_of)?,

        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = wr_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries only `key=value` results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
