//! Canonical daily price-series normalization.
//!
//! Converts raw provider records ([`RawDailyRecord`]) into a [`PriceSeries`]:
//! strictly increasing by date, one point per date, every point carrying a
//! strictly positive open and close.
//!
//! Malformed records (unparseable date, missing / non-finite / non-positive
//! price) are dropped, never reported as errors. Duplicate dates resolve to
//! the record seen last in input order.
//!
//! It does **not**:
//! - fetch data (no providers)
//! - compute any statistics over the series (that is `wr-backtest`)

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::provider::{RawDailyRecord, RecordDate};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One normalized trading session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
}

/// Ordered daily series, strictly increasing by date with no duplicates.
///
/// Only the normalizer constructs a `PriceSeries`; it is immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Convert back into raw records (dates as provider-native values).
    pub fn to_records(&self) -> Vec<RawDailyRecord> {
        self.points
            .iter()
            .map(|p| RawDailyRecord::new(RecordDate::Date(p.date), Some(p.open), Some(p.close)))
            .collect()
    }
}

/// Counters describing what a normalization pass dropped or collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub records_in: usize,
    pub dropped_bad_date: usize,
    pub dropped_bad_price: usize,
    pub duplicates_collapsed: usize,
    pub points_out: usize,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize raw records into a [`PriceSeries`].
///
/// Returns an empty series (not an error) when no valid record remains.
pub fn normalize(records: &[RawDailyRecord]) -> PriceSeries {
    normalize_with_stats(records).0
}

/// Like [`normalize`], also returning per-pass counters.
pub fn normalize_with_stats(records: &[RawDailyRecord]) -> (PriceSeries, NormalizeStats) {
    let mut stats = NormalizeStats {
        records_in: records.len(),
        ..NormalizeStats::default()
    };

    // BTreeMap gives ascending date order; insert overwrites, so last-seen wins.
    let mut by_date: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();

    for rec in records {
        let Some(date) = parse_record_date(&rec.date) else {
            stats.dropped_bad_date += 1;
            continue;
        };
        let (Some(open), Some(close)) = (valid_price(rec.open), valid_price(rec.close)) else {
            stats.dropped_bad_price += 1;
            continue;
        };
        if by_date
            .insert(date, PricePoint { date, open, close })
            .is_some()
        {
            stats.duplicates_collapsed += 1;
        }
    }

    let points: Vec<PricePoint> = by_date.into_values().collect();
    stats.points_out = points.len();
    (PriceSeries { points }, stats)
}

/// Parse a record date into a calendar date, or `None` if it is unusable.
///
/// Accepted text forms: `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`,
/// `YYYY-MM-DD HH:MM:SS` and RFC 3339 (date part kept).
pub fn parse_record_date(date: &RecordDate) -> Option<NaiveDate> {
    match date {
        RecordDate::Date(d) => Some(*d),
        RecordDate::EpochSeconds(ts) => DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()),
        RecordDate::Text(raw) => parse_date_text(raw),
    }
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

fn valid_price(v: Option<f64>) -> Option<f64> {
    v.filter(|p| p.is_finite() && *p > 0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
