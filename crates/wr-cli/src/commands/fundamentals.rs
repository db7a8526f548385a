//! `wr fundamentals`: latest EPS and dividend yield for one ticker.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use wr_md::{FinMindProvider, FundamentalFact, FundamentalsProvider, ProviderKind};

use super::{http_settings, load_config};

pub fn run_fundamentals(
    ticker: String,
    config_paths: Vec<String>,
    as_of: Option<NaiveDate>,
) -> Result<()> {
    let cfg = load_config(&config_paths)?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    let provider = FinMindProvider::with_settings(
        cfg.secrets.finmind_token.clone(),
        http_settings(&cfg.app, ProviderKind::FinMind),
    );

    println!(
        "ticker={} provider={} as_of={}",
        ticker,
        FundamentalsProvider::name(&provider),
        as_of
    );

    let facts = match provider.fetch_fundamentals(&ticker, as_of) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(ticker = %ticker, error = %e, "fundamentals unavailable");
            println!("status=unavailable reason=\"{}\"", e);
            return Ok(());
        }
    };

    println!("status=ok");
    println!("{}", format_fact("eps", facts.eps));
    println!("{}", format_fact("dividend_yield", facts.dividend_yield));
    Ok(())
}

fn format_fact(key: &str, fact: Option<FundamentalFact>) -> String {
    match fact {
        Some(f) => format!("{key}={:.2} {key}_date={}", f.value, f.date),
        None => format!("{key}=n/a"),
    }
}
