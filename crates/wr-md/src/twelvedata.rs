//! TwelveData adapter (generic market-data provider).
//!
//! API key is resolved by the caller and passed in; do not log it. It travels
//! in the query string, which is why transport errors are reported without URLs.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::http::{build_client, get_json, lenient_f64, HttpSettings};
use crate::normalizer::PriceSeries;
use crate::provider::{
    finish_fetch, FetchRequest, PriceProvider, ProviderError, RawDailyRecord, RecordDate,
};

pub const TWELVEDATA_BASE_URL: &str = "https://api.twelvedata.com";

#[derive(Clone)]
pub struct TwelveDataProvider {
    api_key: Option<String>,
    http: Client,
    settings: HttpSettings,
}

impl std::fmt::Debug for TwelveDataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwelveDataProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("settings", &self.settings)
            .finish()
    }
}

impl TwelveDataProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_settings(api_key, HttpSettings::new(TWELVEDATA_BASE_URL))
    }

    pub fn with_settings(api_key: Option<String>, settings: HttpSettings) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http: build_client(&settings),
            settings,
        }
    }
}

impl PriceProvider for TwelveDataProvider {
    fn name(&self) -> &'static str {
        "twelvedata"
    }

    fn fetch_price_history(&self, req: &FetchRequest) -> Result<PriceSeries, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Config("TwelveData api key is not configured".into()))?;

        let start_s = req.start_iso();
        let end_s = req.end_iso();

        let http_req = self.http.get(self.settings.url("/time_series")).query(&[
            ("symbol", req.ticker.as_str()),
            ("interval", "1day"),
            ("start_date", start_s.as_str()),
            ("end_date", end_s.as_str()),
            ("order", "ASC"),
            ("format", "JSON"),
            ("apikey", api_key),
        ]);

        let body: TimeSeriesResponse = get_json(http_req)?;

        if let Some(err) = body.error_message() {
            return Err(ProviderError::Api {
                code: body.code,
                message: err,
            });
        }

        let records: Vec<RawDailyRecord> = body
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|v| RawDailyRecord::new(RecordDate::Text(v.datetime), v.open, v.close))
            .collect();

        finish_fetch(self.name(), req, &records)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TimeSeriesResponse {
    status: Option<String>,
    message: Option<String>,
    code: Option<i64>,
    values: Option<Vec<TimeSeriesValue>>,
}

impl TimeSeriesResponse {
    fn error_message(&self) -> Option<String> {
        // TwelveData signals failure with "status":"error" plus code/message.
        match self.status.as_deref() {
            Some("error") => Some(
                self.message
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TimeSeriesValue {
    #[serde(default)]
    datetime: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    close: Option<f64>,
}
