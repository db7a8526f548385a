//! Provider boundary for daily price-history retrieval.
//!
//! This module defines the raw record type handed to the normalizer, the
//! fetch request, the uniform error ("unavailable") taxonomy and the
//! provider trait. Concrete adapters live in their own modules.

use std::fmt;

use chrono::NaiveDate;

use crate::normalizer::PriceSeries;

// ---------------------------------------------------------------------------
// Raw record
// ---------------------------------------------------------------------------

/// Date of a raw record, in whatever shape the provider delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDate {
    /// A calendar-date string (e.g. `"2024-03-01"`, `"2024/03/01"`).
    Text(String),
    /// Already a calendar date.
    Date(NaiveDate),
    /// UTC epoch seconds (session timestamp).
    EpochSeconds(i64),
}

/// One daily record exactly as mapped out of a provider payload.
///
/// `open` / `close` are `None` when the provider returned null or an
/// unparseable value; the normalizer drops such records.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDailyRecord {
    pub date: RecordDate,
    pub open: Option<f64>,
    pub close: Option<f64>,
}

impl RawDailyRecord {
    pub fn new(date: RecordDate, open: Option<f64>, close: Option<f64>) -> Self {
        Self { date, open, close }
    }
}

// ---------------------------------------------------------------------------
// Fetch request
// ---------------------------------------------------------------------------

/// Parameters for one price-history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    /// Ticker in the provider's own symbol format (e.g. `"2330"`, `"2330.TW"`).
    pub ticker: String,
    /// Inclusive start date.
    pub start: NaiveDate,
    /// Inclusive end date.
    pub end: NaiveDate,
}

impl FetchRequest {
    pub fn new(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start,
            end,
        }
    }

    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Why a provider could not deliver a series.
///
/// Every variant means "unavailable" to callers; the distinction only
/// matters for logs and operator output. Messages never carry credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network or transport failure (connect, timeout, TLS).
    Transport(String),
    /// Non-success HTTP status.
    Http { status: u16 },
    /// The upstream API reported an application-level error.
    Api { code: Option<i64>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// A required credential is missing.
    Config(String),
    /// Well-formed response with no usable rows.
    Empty,
}

impl ProviderError {
    pub fn is_config(&self) -> bool {
        matches!(self, ProviderError::Config(_))
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Http { status } => write!(f, "http error status={status}"),
            ProviderError::Api {
                code: Some(c),
                message,
            } => {
                write!(f, "provider api error code={c}: {message}")
            }
            ProviderError::Api {
                code: None,
                message,
            } => {
                write!(f, "provider api error: {message}")
            }
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
            ProviderError::Empty => write!(f, "provider returned no usable rows"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Daily price-history source.
///
/// Object safe, so callers hold `Box<dyn PriceProvider>` / `&dyn PriceProvider`
/// without knowing the backing API. Implementations must catch every parse
/// failure and report it as a [`ProviderError`]; they never panic on payload
/// content.
pub trait PriceProvider: Send + Sync {
    /// Short stable name (e.g. `"finmind"`), also used as a cache key component.
    fn name(&self) -> &'static str;

    /// Fetch and normalize the daily history for `req.ticker` within `[start, end]`.
    ///
    /// `Ok` is never empty: an empty result is reported as [`ProviderError::Empty`].
    fn fetch_price_history(&self, req: &FetchRequest) -> Result<PriceSeries, ProviderError>;
}

impl<P: PriceProvider + ?Sized> PriceProvider for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch_price_history(&self, req: &FetchRequest) -> Result<PriceSeries, ProviderError> {
        (**self).fetch_price_history(req)
    }
}

/// Normalize adapter records and map an empty result to [`ProviderError::Empty`].
///
/// Shared tail of every adapter's fetch path.
pub(crate) fn finish_fetch(
    provider: &'static str,
    req: &FetchRequest,
    records: &[RawDailyRecord],
) -> Result<PriceSeries, ProviderError> {
    let (series, stats) = crate::normalizer::normalize_with_stats(records);
    tracing::debug!(
        provider,
        ticker = %req.ticker,
        records_in = stats.records_in,
        dropped_bad_date = stats.dropped_bad_date,
        dropped_bad_price = stats.dropped_bad_price,
        duplicates_collapsed = stats.duplicates_collapsed,
        points_out = stats.points_out,
        "normalized price history"
    );
    if series.is_empty() {
        return Err(ProviderError::Empty);
    }
    Ok(series)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
