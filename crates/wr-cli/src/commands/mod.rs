//! Command handler modules for the `wr` binary.
//!
//! Shared wiring (config loading, provider assembly, date windows) lives
//! here; command-specific logic lives in the submodules.

pub mod backtest;
pub mod fundamentals;
pub mod rank;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Days, Local, NaiveDate};
use wr_config::{
    report_unused_keys, resolve_secrets, AppConfig, LoadedConfig, ResolvedSecrets,
    UnusedKeyPolicy,
};
use wr_md::{build_provider, HttpSettings, PriceProvider, ProviderCredential, ProviderKind};

/// Effective configuration for one invocation.
pub struct Loaded {
    pub loaded: LoadedConfig,
    pub app: AppConfig,
    pub secrets: ResolvedSecrets,
}

/// Merge `paths` (none => all defaults), validate, resolve credentials.
/// Unused keys are logged, not fatal.
pub fn load_config(paths: &[String]) -> Result<Loaded> {
    let loaded = if paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        wr_config::load_layered_yaml(&refs)?
    };

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &report.unused_leaf_pointers {
        tracing::warn!(key = %ptr, "unused config key");
    }

    let app = AppConfig::from_json(&loaded.config_json)?;
    let secrets = resolve_secrets(&loaded.config_json);
    tracing::debug!(config_hash = %loaded.config_hash, ?secrets, "config loaded");

    Ok(Loaded {
        loaded,
        app,
        secrets,
    })
}

pub fn parse_provider_kind(name: &str) -> Result<ProviderKind> {
    match ProviderKind::parse(name) {
        Some(k) => Ok(k),
        None => bail!(
            "invalid provider '{}'. expected one of: finmind | yahoo | twelvedata",
            name
        ),
    }
}

pub fn http_settings(app: &AppConfig, kind: ProviderKind) -> HttpSettings {
    let endpoints = &app.data.providers;
    let base_url = match kind {
        ProviderKind::FinMind => endpoints.finmind_base_url(),
        ProviderKind::Yahoo => endpoints.yahoo_base_url(),
        ProviderKind::TwelveData => endpoints.twelvedata_base_url(),
    };
    HttpSettings::new(base_url).with_timeout(Duration::from_secs(app.data.http.timeout_secs))
}

/// Provider named by `override_name`, else by config.
pub fn price_provider(
    cfg: &Loaded,
    override_name: Option<&str>,
) -> Result<(ProviderKind, Box<dyn PriceProvider>)> {
    let kind = parse_provider_kind(override_name.unwrap_or(&cfg.app.data.provider))?;
    let credential = match kind {
        ProviderKind::FinMind => cfg.secrets.finmind_token.clone(),
        ProviderKind::Yahoo => None,
        ProviderKind::TwelveData => cfg.secrets.twelvedata_api_key.clone(),
    };
    let provider = build_provider(kind, http_settings(&cfg.app, kind), ProviderCredential(credential));
    Ok((kind, provider))
}

/// `[as_of - lookback_days, as_of]`
pub fn fetch_window(as_of: Option<NaiveDate>, lookback_days: u32) -> Result<(NaiveDate, NaiveDate)> {
    let end = as_of.unwrap_or_else(|| Local::now().date_naive());
    let start = end
        .checked_sub_days(Days::new(u64::from(lookback_days)))
        .context("lookback window starts before the supported date range")?;
    Ok((start, end))
}

/// `n/a` for missing values; two decimals otherwise.
pub fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x))
        .unwrap_or_else(|| "n/a".to_string())
}
