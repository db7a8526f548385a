//! wr-md
//!
//! Daily price-history retrieval (pluggable providers) and normalization.
//!
//! This crate owns the provider abstraction, the concrete adapters, the
//! normalizer and the per-session fetch cache. It computes no statistics;
//! callers hand the resulting [`PriceSeries`] to `wr-backtest`.

pub mod cache;
pub mod finmind;
pub mod fundamentals;
pub mod http;
pub mod normalizer;
pub mod provider;
pub mod twelvedata;
pub mod yahoo;

use std::fmt;

pub use cache::CachedProvider;
pub use finmind::FinMindProvider;
pub use fundamentals::{FundamentalFact, Fundamentals, FundamentalsProvider};
pub use http::HttpSettings;
pub use normalizer::{normalize, normalize_with_stats, NormalizeStats, PricePoint, PriceSeries};
pub use provider::{FetchRequest, PriceProvider, ProviderError, RawDailyRecord, RecordDate};
pub use twelvedata::TwelveDataProvider;
pub use yahoo::YahooChartProvider;

/// Supported price-history sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Token-authenticated REST API.
    FinMind,
    /// Free community chart API.
    Yahoo,
    /// Generic market-data provider.
    TwelveData,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::FinMind => "finmind",
            ProviderKind::Yahoo => "yahoo",
            ProviderKind::TwelveData => "twelvedata",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "finmind" => Some(ProviderKind::FinMind),
            "yahoo" => Some(ProviderKind::Yahoo),
            "twelvedata" | "twelve_data" => Some(ProviderKind::TwelveData),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential handed to [`build_provider`]; ignored by providers that need none.
pub struct ProviderCredential(pub Option<String>);

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderCredential")
            .field(&self.0.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Assemble a boxed provider for `kind`.
pub fn build_provider(
    kind: ProviderKind,
    settings: HttpSettings,
    credential: ProviderCredential,
) -> Box<dyn PriceProvider> {
    match kind {
        ProviderKind::FinMind => Box::new(FinMindProvider::with_settings(credential.0, settings)),
        ProviderKind::Yahoo => Box::new(YahooChartProvider::with_settings(settings)),
        ProviderKind::TwelveData => {
            Box::new(TwelveDataProvider::with_settings(credential.0, settings))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parse() {
        assert_eq!(ProviderKind::parse("FinMind"), Some(ProviderKind::FinMind));
        assert_eq!(ProviderKind::parse(" yahoo "), Some(ProviderKind::Yahoo));
        assert_eq!(
            ProviderKind::parse("twelvedata"),
            Some(ProviderKind::TwelveData)
        );
        assert_eq!(ProviderKind::parse("bloomberg"), None);
    }

    #[test]
    fn build_provider_names_match_kind() {
        for kind in [
            ProviderKind::FinMind,
            ProviderKind::Yahoo,
            ProviderKind::TwelveData,
        ] {
            let p = build_provider(
                kind,
                HttpSettings::new("http://127.0.0.1:9"),
                ProviderCredential(None),
            );
            assert_eq!(p.name(), kind.as_str());
        }
    }
}
