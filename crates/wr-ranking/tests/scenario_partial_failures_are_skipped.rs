use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use wr_md::{normalize, FetchRequest, PriceProvider, PriceSeries, ProviderError, RawDailyRecord, RecordDate};
use wr_ranking::{rank_tickers, RankingConfig, SkipReason, WatchItem};

struct MapProvider {
    series: HashMap<&'static str, Result<PriceSeries, ProviderError>>,
}

impl PriceProvider for MapProvider {
    fn name(&self) -> &'static str {
        "map"
    }

    fn fetch_price_history(&self, req: &FetchRequest) -> Result<PriceSeries, ProviderError> {
        self.series
            .get(req.ticker.as_str())
            .cloned()
            .unwrap_or(Err(ProviderError::Empty))
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// `samples` valid rows; the first `wins` gap up 2% overnight.
fn series_with(samples: usize, wins: usize) -> PriceSeries {
    let start = d(2024, 2, 1);
    let records: Vec<RawDailyRecord> = (0..samples + 2)
        .map(|k| {
            let open = if (1..=wins).contains(&k) { 102.0 } else { 100.0 };
            RawDailyRecord::new(
                RecordDate::Date(start + Days::new(k as u64)),
                Some(open),
                Some(100.0),
            )
        })
        .collect();
    normalize(&records)
}

#[test]
fn only_the_healthy_ticker_is_ranked() {
    let provider = MapProvider {
        series: HashMap::from([
            ("A", Ok(series_with(5, 5))),
            ("B", Ok(series_with(30, 24))),
            (
                "C",
                Err(ProviderError::Transport("connection reset".to_string())),
            ),
        ]),
    };
    let items = [WatchItem::new("A"), WatchItem::new("B"), WatchItem::new("C")];
    let cfg = RankingConfig::new(d(2024, 2, 1), d(2024, 4, 30));

    let run = rank_tickers(&items, &provider, &cfg);

    assert_eq!(run.entries.len(), 1);
    assert_eq!(run.entries[0].ticker, "B");
    assert_eq!(run.entries[0].sample_count, 30);
    assert_eq!(run.entries[0].overnight_win_rate, 80.0);

    assert_eq!(run.skipped.len(), 2);
    assert_eq!(
        run.skipped[0],
        (
            "A".to_string(),
            SkipReason::InsufficientSample {
                sample_count: 5,
                required: 10
            }
        )
    );
    assert_eq!(run.skipped[1].0, "C");
    assert!(matches!(run.skipped[1].1, SkipReason::Unavailable(_)));
}

#[test]
fn empty_series_is_excluded_even_with_zero_minimum() {
    let provider = MapProvider {
        series: HashMap::from([("EMPTY", Ok(normalize(&[]))), ("OK", Ok(series_with(3, 1)))]),
    };
    let mut cfg = RankingConfig::new(d(2024, 2, 1), d(2024, 4, 30));
    cfg.min_sample_count = 0;

    let run = rank_tickers(&[WatchItem::new("EMPTY"), WatchItem::new("OK")], &provider, &cfg);

    assert_eq!(run.entries.len(), 1);
    assert_eq!(run.entries[0].ticker, "OK");
    assert_eq!(
        run.skipped,
        vec![(
            "EMPTY".to_string(),
            SkipReason::InsufficientSample {
                sample_count: 0,
                required: 1
            }
        )]
    );
}

#[test]
fn all_unavailable_yields_empty_leaderboard() {
    let provider = MapProvider {
        series: HashMap::new(),
    };
    let items = [WatchItem::new("X"), WatchItem::new("Y")];
    let run = rank_tickers(&items, &provider, &RankingConfig::new(d(2024, 1, 1), d(2024, 3, 1)));
    assert!(run.entries.is_empty());
    assert_eq!(run.skipped.len(), 2);
}
