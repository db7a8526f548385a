//! Point lookups of latest fundamentals (EPS, dividend yield).
//!
//! Independent of price backtesting. A fact the provider does not carry for
//! a ticker is `None`; only a failure of every lookup is an error.

use chrono::{Months, NaiveDate};
use serde::Deserialize;

use crate::finmind::{FinMindProvider, DATASET_FINANCIALS, DATASET_PER};
use crate::http::lenient_f64;
use crate::normalizer::parse_record_date;
use crate::provider::{ProviderError, RecordDate};

/// One dated fundamental value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FundamentalFact {
    pub value: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fundamentals {
    pub ticker: String,
    /// Latest reported earnings per share.
    pub eps: Option<FundamentalFact>,
    /// Latest dividend yield, in percent.
    pub dividend_yield: Option<FundamentalFact>,
}

pub trait FundamentalsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Latest facts on or before `as_of`.
    fn fetch_fundamentals(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<Fundamentals, ProviderError>;
}

/// Pick the fact with the greatest date; on equal dates the later row wins.
pub fn latest_fact<I>(rows: I) -> Option<FundamentalFact>
where
    I: IntoIterator<Item = (String, Option<f64>)>,
{
    rows.into_iter()
        .filter_map(|(date, value)| {
            let date = parse_record_date(&RecordDate::Text(date))?;
            let value = value.filter(|v| v.is_finite())?;
            Some(FundamentalFact { value, date })
        })
        .fold(None, |best: Option<FundamentalFact>, f| match best {
            Some(b) if b.date > f.date => Some(b),
            _ => Some(f),
        })
}

#[derive(Debug, Deserialize)]
struct PerRow {
    #[serde(default)]
    date: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    dividend_yield: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatementRow {
    #[serde(default)]
    date: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    value: Option<f64>,
}

impl FundamentalsProvider for FinMindProvider {
    fn name(&self) -> &'static str {
        "finmind"
    }

    fn fetch_fundamentals(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<Fundamentals, ProviderError> {
        // Quarterly statements: a one-year window always holds the latest report.
        let start = as_of.checked_sub_months(Months::new(12)).unwrap_or(as_of);

        let eps_rows = self.query_dataset::<StatementRow>(DATASET_FINANCIALS, ticker, start, as_of);
        if let Err(e) = &eps_rows {
            if e.is_config() {
                return Err(e.clone());
            }
            tracing::warn!(ticker, error = %e, "eps lookup unavailable");
        }

        let per_rows = self.query_dataset::<PerRow>(DATASET_PER, ticker, start, as_of);
        if let Err(e) = &per_rows {
            tracing::warn!(ticker, error = %e, "dividend yield lookup unavailable");
        }

        let (eps_rows, per_rows) = match (eps_rows, per_rows) {
            (Err(e), Err(_)) => return Err(e),
            (eps, per) => (eps.unwrap_or_default(), per.unwrap_or_default()),
        };

        let eps = latest_fact(
            eps_rows
                .into_iter()
                .filter(|r| r.kind == "EPS")
                .map(|r| (r.date, r.value)),
        );
        let dividend_yield = latest_fact(per_rows.into_iter().map(|r| (r.date, r.dividend_yield)));

        Ok(Fundamentals {
            ticker: ticker.to_string(),
            eps,
            dividend_yield,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn latest_fact_picks_greatest_date() {
        let f = latest_fact(vec![
            ("2024-03-31".to_string(), Some(8.7)),
            ("2024-06-30".to_string(), Some(9.56)),
            ("2023-12-31".to_string(), Some(9.21)),
        ])
        .unwrap();
        assert_eq!(f.value, 9.56);
        assert_eq!(f.date, d(2024, 6, 30));
    }

    #[test]
    fn latest_fact_skips_bad_rows() {
        let f = latest_fact(vec![
            ("2024-06-30".to_string(), None),
            ("garbage".to_string(), Some(1.0)),
            ("2024-03-31".to_string(), Some(2.0)),
        ])
        .unwrap();
        assert_eq!(f.value, 2.0);
    }

    #[test]
    fn latest_fact_equal_dates_later_row_wins() {
        let f = latest_fact(vec![
            ("2024-03-31".to_string(), Some(1.0)),
            ("2024-03-31".to_string(), Some(2.0)),
        ])
        .unwrap();
        assert_eq!(f.value, 2.0);
    }

    #[test]
    fn latest_fact_empty_is_none() {
        assert!(latest_fact(Vec::<(String, Option<f64>)>::new()).is_none());
    }

    #[test]
    fn missing_token_is_config_error() {
        let p = FinMindProvider::new(None);
        let err = p.fetch_fundamentals("2330", d(2024, 9, 30)).unwrap_err();
        assert!(err.is_config());
    }
}
