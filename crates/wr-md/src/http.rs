//! Blocking HTTP plumbing shared by the adapters.
//!
//! Every reqwest failure is mapped into a [`ProviderError`] here, with the
//! request URL stripped (query strings may carry API keys).

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::provider::ProviderError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Endpoint settings for one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join `path` onto the base URL without doubling slashes.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// [`Self::url`] plus `segment` as one percent-encoded path segment, so a
    /// symbol holding `/`, `?` or `#` cannot reshape the request.
    pub fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url, ProviderError> {
        let raw = self.url(path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ProviderError::Config(format!("invalid base url {raw}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Config(format!("base url cannot take a path: {raw}")))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }
}

pub(crate) fn build_client(settings: &HttpSettings) -> Client {
    Client::builder()
        .timeout(settings.timeout)
        .build()
        // Builder only fails when the TLS backend cannot initialise; fall back
        // to the default client (no custom timeout) rather than panicking.
        .unwrap_or_else(|_| Client::new())
}

/// Send `req` and decode a JSON body of type `T`.
pub(crate) fn get_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ProviderError> {
    let resp = req
        .send()
        .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderError::Http {
            status: status.as_u16(),
        });
    }

    let body = resp
        .text()
        .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

    serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Lenient numeric field: JSON number, numeric string, or null.
///
/// Providers disagree on whether prices are numbers or strings.
pub(crate) fn lenient_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<NumOrText>::deserialize(de)? {
        Some(NumOrText::Num(v)) => Some(v),
        Some(NumOrText::Text(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_f64")]
        v: Option<f64>,
    }

    fn parse(json: &str) -> Option<f64> {
        serde_json::from_str::<Row>(json).unwrap().v
    }

    #[test]
    fn lenient_accepts_number_string_null_and_missing() {
        assert_eq!(parse(r#"{"v": 12.5}"#), Some(12.5));
        assert_eq!(parse(r#"{"v": "1,234.5"}"#), Some(1234.5));
        assert_eq!(parse(r#"{"v": null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
        assert_eq!(parse(r#"{"v": "--"}"#), None);
    }

    #[test]
    fn url_join_handles_slashes() {
        let s = HttpSettings::new("http://localhost:1234/");
        assert_eq!(s.url("/api/v4/data"), "http://localhost:1234/api/v4/data");
        assert_eq!(s.url("time_series"), "http://localhost:1234/time_series");
    }

    #[test]
    fn segment_is_percent_encoded() {
        let s = HttpSettings::new("http://localhost:1234/");
        let url = |seg: &str| s.url_with_segment("/v8/finance/chart", seg).unwrap().to_string();
        assert_eq!(url("2330.TW"), "http://localhost:1234/v8/finance/chart/2330.TW");
        assert_eq!(url("BRK/B"), "http://localhost:1234/v8/finance/chart/BRK%2FB");
        assert_eq!(url("A?x=1#f"), "http://localhost:1234/v8/finance/chart/A%3Fx=1%23f");
    }

    #[test]
    fn unparsable_base_url_is_config_error() {
        let s = HttpSettings::new("not a url");
        assert!(s.url_with_segment("/v8/finance/chart", "AAA").unwrap_err().is_config());
    }
}
