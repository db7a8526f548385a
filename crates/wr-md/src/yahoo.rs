//! Yahoo chart adapter (free community API, no credential).
//!
//! `GET /v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d`
//! returns parallel arrays: `timestamp[i]` pairs with
//! `indicators.quote[0].open[i]` / `close[i]`, either of which may be `null`.

use chrono::{NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::http::{build_client, get_json, HttpSettings};
use crate::normalizer::PriceSeries;
use crate::provider::{
    finish_fetch, FetchRequest, PriceProvider, ProviderError, RawDailyRecord, RecordDate,
};

pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; wr-md)";

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: Client,
    settings: HttpSettings,
}

impl Default for YahooChartProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooChartProvider {
    pub fn new() -> Self {
        Self::with_settings(HttpSettings::new(YAHOO_BASE_URL))
    }

    pub fn with_settings(settings: HttpSettings) -> Self {
        Self {
            http: build_client(&settings),
            settings,
        }
    }
}

/// Epoch seconds at 00:00 UTC of `d`.
fn day_start_epoch(d: NaiveDate) -> i64 {
    d.and_time(NaiveTime::MIN).and_utc().timestamp()
}

impl PriceProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch_price_history(&self, req: &FetchRequest) -> Result<PriceSeries, ProviderError> {
        // period2 is exclusive: extend one day so `end` is included.
        let period1 = day_start_epoch(req.start).to_string();
        let period2 = (day_start_epoch(req.end) + 86_400).to_string();

        let url = self.settings.url_with_segment("/v8/finance/chart", &req.ticker)?;
        let http_req = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "history"),
            ]);

        let body: ChartEnvelope = get_json(http_req)?;

        if let Some(err) = body.chart.error {
            return Err(ProviderError::Api {
                code: None,
                message: err.describe(),
            });
        }

        let Some(result) = body.chart.result.and_then(|r| r.into_iter().next()) else {
            return Err(ProviderError::Empty);
        };

        let records = result.into_records();
        finish_fetch(self.name(), req, &records)
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

impl ChartError {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(c), Some(d)) => format!("{c}: {d}"),
            (Some(c), None) => c.clone(),
            (None, Some(d)) => d.clone(),
            (None, None) => "unknown".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Option<Vec<Quote>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
}

impl ChartResult {
    /// Zip the parallel arrays; a short or missing price array yields `None` prices.
    fn into_records(self) -> Vec<RawDailyRecord> {
        // Session timestamps are exchange-local opens; shift so the UTC date is the local date.
        // Saturating keeps an absurd timestamp out of chrono's range, so it drops as a bad date.
        let offset = self.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        let quote = self
            .indicators
            .and_then(|i| i.quote)
            .and_then(|q| q.into_iter().next());
        let (opens, closes) = match quote {
            Some(q) => (q.open.unwrap_or_default(), q.close.unwrap_or_default()),
            None => (Vec::new(), Vec::new()),
        };

        self.timestamp
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, ts)| {
                RawDailyRecord::new(
                    RecordDate::EpochSeconds(ts.saturating_add(offset)),
                    opens.get(i).copied().flatten(),
                    closes.get(i).copied().flatten(),
                )
            })
            .collect()
    }
}
