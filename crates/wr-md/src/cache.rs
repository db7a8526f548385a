//! Memoizing wrapper around a [`PriceProvider`].
//!
//! Keyed by `(provider, ticker, start, end)`. Only successful series are
//! kept; unavailable outcomes are retried on the next call. The cache lives
//! as long as the wrapper and is cleared explicitly with
//! [`CachedProvider::invalidate`] (the manual refresh action).

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::normalizer::PriceSeries;
use crate::provider::{FetchRequest, PriceProvider, ProviderError};

type CacheKey = (&'static str, String, NaiveDate, NaiveDate);

pub struct CachedProvider<P> {
    inner: P,
    entries: Mutex<HashMap<CacheKey, PriceSeries>>,
}

impl<P: PriceProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop every memoized series.
    pub fn invalidate(&self) {
        self.lock().clear();
    }

    /// Number of memoized series.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, req: &FetchRequest) -> CacheKey {
        (self.inner.name(), req.ticker.clone(), req.start, req.end)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, PriceSeries>> {
        // A poisoned map only means a panic elsewhere mid-insert; the data is still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<P: PriceProvider> PriceProvider for CachedProvider<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn fetch_price_history(&self, req: &FetchRequest) -> Result<PriceSeries, ProviderError> {
        let key = self.key(req);
        if let Some(hit) = self.lock().get(&key) {
            tracing::debug!(provider = key.0, ticker = %req.ticker, "price cache hit");
            return Ok(hit.clone());
        }

        // Lock is not held across the network call.
        let series = self.inner.fetch_price_history(req)?;
        self.lock().insert(key, series.clone());
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::provider::{RawDailyRecord, RecordDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl PriceProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn fetch_price_history(&self, _req: &FetchRequest) -> Result<PriceSeries, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Transport("connection refused".into()));
            }
            Ok(normalize(&[RawDailyRecord::new(
                RecordDate::Text("2024-01-02".into()),
                Some(1.0),
                Some(1.0),
            )]))
        }
    }

    fn counting(fail: bool) -> CachedProvider<CountingProvider> {
        CachedProvider::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    fn req(ticker: &str, end_day: u32) -> FetchRequest {
        FetchRequest::new(
            ticker,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, end_day).unwrap(),
        )
    }

    #[test]
    fn repeated_request_hits_cache() {
        let p = counting(false);
        let a = p.fetch_price_history(&req("2330", 31)).unwrap();
        let b = p.fetch_price_history(&req("2330", 31)).unwrap();
        assert_eq!(a, b);
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn distinct_range_or_ticker_is_a_miss() {
        let p = counting(false);
        p.fetch_price_history(&req("2330", 31)).unwrap();
        p.fetch_price_history(&req("2330", 30)).unwrap();
        p.fetch_price_history(&req("2317", 31)).unwrap();
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let p = counting(false);
        p.fetch_price_history(&req("2330", 31)).unwrap();
        p.invalidate();
        assert!(p.is_empty());
        p.fetch_price_history(&req("2330", 31)).unwrap();
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_are_not_memoized() {
        let p = counting(true);
        assert!(p.fetch_price_history(&req("2330", 31)).is_err());
        assert!(p.fetch_price_history(&req("2330", 31)).is_err());
        assert_eq!(p.inner().calls.load(Ordering::SeqCst), 2);
        assert!(p.is_empty());
    }
}
