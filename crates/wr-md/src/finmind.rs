//! FinMind adapter (token-authenticated REST API).
//!
//! All datasets are served by one endpoint, `GET /api/v4/data`, selected by
//! the `dataset` query parameter. The bearer token is supplied by the caller
//! at construction; a missing token fails each fetch with
//! [`ProviderError::Config`] before any network call.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::http::{build_client, get_json, lenient_f64, HttpSettings};
use crate::normalizer::PriceSeries;
use crate::provider::{
    finish_fetch, FetchRequest, PriceProvider, ProviderError, RawDailyRecord, RecordDate,
};

pub const FINMIND_BASE_URL: &str = "https://api.finmindtrade.com";

pub(crate) const DATASET_PRICE: &str = "TaiwanStockPrice";
pub(crate) const DATASET_PER: &str = "TaiwanStockPER";
pub(crate) const DATASET_FINANCIALS: &str = "TaiwanStockFinancialStatements";

#[derive(Clone)]
pub struct FinMindProvider {
    token: Option<String>,
    http: Client,
    settings: HttpSettings,
}

impl std::fmt::Debug for FinMindProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinMindProvider")
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("settings", &self.settings)
            .finish()
    }
}

impl FinMindProvider {
    pub fn new(token: Option<String>) -> Self {
        Self::with_settings(token, HttpSettings::new(FINMIND_BASE_URL))
    }

    pub fn with_settings(token: Option<String>, settings: HttpSettings) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        Self {
            token,
            http: build_client(&settings),
            settings,
        }
    }

    /// Query one FinMind dataset and return its `data` rows.
    ///
    /// `status != 200` in the body is an API error even when HTTP is 200.
    pub(crate) fn query_dataset<T: DeserializeOwned>(
        &self,
        dataset: &str,
        data_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<T>, ProviderError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| ProviderError::Config("FinMind token is not configured".to_string()))?;

        let start_s = start.format("%Y-%m-%d").to_string();
        let end_s = end.format("%Y-%m-%d").to_string();

        let req = self
            .http
            .get(self.settings.url("/api/v4/data"))
            .bearer_auth(token)
            .query(&[
                ("dataset", dataset),
                ("data_id", data_id),
                ("start_date", start_s.as_str()),
                ("end_date", end_s.as_str()),
            ]);

        let body: FinMindResponse<T> = get_json(req)?;
        if body.status != Some(200) {
            return Err(ProviderError::Api {
                code: body.status,
                message: body.msg.unwrap_or_else(|| "unknown".to_string()),
            });
        }
        Ok(body.data.unwrap_or_default())
    }
}

impl PriceProvider for FinMindProvider {
    fn name(&self) -> &'static str {
        "finmind"
    }

    fn fetch_price_history(&self, req: &FetchRequest) -> Result<PriceSeries, ProviderError> {
        let rows: Vec<FinMindPriceRow> =
            self.query_dataset(DATASET_PRICE, &req.ticker, req.start, req.end)?;

        let records: Vec<RawDailyRecord> = rows
            .into_iter()
            .map(|r| RawDailyRecord::new(RecordDate::Text(r.date), r.open, r.close))
            .collect();

        finish_fetch(self.name(), req, &records)
    }
}

#[derive(Debug, Deserialize)]
struct FinMindResponse<T> {
    msg: Option<String>,
    status: Option<i64>,
    data: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct FinMindPriceRow {
    #[serde(default)]
    date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    close: Option<f64>,
}
