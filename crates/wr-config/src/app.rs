//! Typed view over the merged config JSON.
//!
//! Every key is optional; absent keys take the defaults below. Threshold
//! bounds are checked here so bad YAML fails before any fetch happens.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const THRESHOLD_MIN_PCT: f64 = 0.5;
pub const THRESHOLD_MAX_PCT: f64 = 5.0;

pub const FINMIND_DEFAULT_URL: &str = "https://api.finmindtrade.com";
pub const YAHOO_DEFAULT_URL: &str = "https://query1.finance.yahoo.com";
pub const TWELVEDATA_DEFAULT_URL: &str = "https://api.twelvedata.com";

/// Fail with CONFIG_THRESHOLD_OUT_OF_RANGE unless `value` is in `0.5..=5.0`.
pub fn validate_threshold(name: &str, value: f64) -> Result<f64> {
    if !(THRESHOLD_MIN_PCT..=THRESHOLD_MAX_PCT).contains(&value) {
        bail!(
            "CONFIG_THRESHOLD_OUT_OF_RANGE {}={} (allowed {}..={})",
            name,
            value,
            THRESHOLD_MIN_PCT,
            THRESHOLD_MAX_PCT
        );
    }
    Ok(value)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSettings,
    pub backtest: BacktestSettings,
    pub ranking: RankingSettings,
    pub watchlist: Vec<WatchlistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// `finmind | yahoo | twelvedata`
    pub provider: String,
    /// Calendar days of history fetched, ending today.
    pub lookback_days: u32,
    pub http: HttpSettingsConfig,
    pub providers: ProviderEndpoints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettingsConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoints {
    pub finmind: ProviderEndpoint,
    pub yahoo: ProviderEndpoint,
    pub twelvedata: ProviderEndpoint,
}

/// Base URL override plus, where the provider needs one, the NAME of the env
/// var holding its credential. Unset fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl ProviderEndpoint {
    fn base_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub overnight_threshold_pct: f64,
    pub three_day_threshold_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    pub min_sample_count: usize,
    pub top_n: usize,
    pub min_overnight_win_rate: Option<f64>,
    pub cache_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            provider: "finmind".to_string(),
            lookback_days: 180,
            http: HttpSettingsConfig::default(),
            providers: ProviderEndpoints::default(),
        }
    }
}

impl Default for HttpSettingsConfig {
    fn default() -> Self {
        Self { timeout_secs: 15 }
    }
}

impl ProviderEndpoints {
    pub fn finmind_base_url(&self) -> &str {
        self.finmind.base_url_or(FINMIND_DEFAULT_URL)
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.yahoo.base_url_or(YAHOO_DEFAULT_URL)
    }

    pub fn twelvedata_base_url(&self) -> &str {
        self.twelvedata.base_url_or(TWELVEDATA_DEFAULT_URL)
    }
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            overnight_threshold_pct: 1.5,
            three_day_threshold_pct: 2.5,
        }
    }
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            min_sample_count: 10,
            top_n: 10,
            min_overnight_win_rate: None,
            cache_path: "wr_ranking.csv".to_string(),
        }
    }
}

impl AppConfig {
    /// Typed, validated view of a merged config.
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: AppConfig = serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: config does not match the expected shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold(
            "backtest.overnight_threshold_pct",
            self.backtest.overnight_threshold_pct,
        )?;
        validate_threshold(
            "backtest.three_day_threshold_pct",
            self.backtest.three_day_threshold_pct,
        )?;
        if self.data.lookback_days == 0 {
            bail!("CONFIG_INVALID data.lookback_days must be > 0");
        }
        if self.ranking.top_n == 0 {
            bail!("CONFIG_INVALID ranking.top_n must be > 0");
        }
        if self.data.http.timeout_secs == 0 {
            bail!("CONFIG_INVALID data.http.timeout_secs must be > 0");
        }
        if let Some(w) = self.ranking.min_overnight_win_rate {
            if !(0.0..=100.0).contains(&w) {
                bail!("CONFIG_INVALID ranking.min_overnight_win_rate={} (allowed 0..=100)", w);
            }
        }
        if let Some(item) = self.watchlist.iter().find(|i| i.ticker.trim().is_empty()) {
            bail!("CONFIG_INVALID watchlist entry with empty ticker (name={:?})", item.name);
        }
        Ok(())
    }
}
