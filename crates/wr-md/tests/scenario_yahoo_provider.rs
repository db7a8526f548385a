// Yahoo chart adapter against a local mock server (no real network).

use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;
use wr_md::{FetchRequest, HttpSettings, PriceProvider, ProviderError, YahooChartProvider};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn provider(server: &MockServer) -> YahooChartProvider {
    YahooChartProvider::with_settings(HttpSettings::new(server.base_url()))
}

#[test]
fn chart_arrays_become_series() {
    let server = MockServer::start();
    // 2024-01-02 .. 2024-01-05 01:00 UTC (09:00 Taipei)
    let m = server.mock(|when, then| {
        when.method(GET)
            .path("/v8/finance/chart/2330.TW")
            .query_param("interval", "1d")
            .query_param("period1", "1704067200")
            .query_param("period2", "1704931200");
        then.status(200).json_body(json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "2330.TW", "gmtoffset": 28800},
                    "timestamp": [1704157200, 1704243600, 1704330000, 1704416400],
                    "indicators": {"quote": [{
                        "open":  [590.0, 584.0, null, 580.0],
                        "close": [593.0, 586.0, 581.0, 578.0]
                    }]}
                }],
                "error": null
            }
        }));
    });

    let series = provider(&server)
        .fetch_price_history(&FetchRequest::new("2330.TW", d(2024, 1, 1), d(2024, 1, 10)))
        .expect("series");

    m.assert();
    assert_eq!(series.len(), 3);
    assert_eq!(series.first_date(), Some(d(2024, 1, 2)));
    assert_eq!(series.points()[1].date, d(2024, 1, 3));
    assert_eq!(series.last_date(), Some(d(2024, 1, 5)));
}

#[test]
fn chart_error_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/NOPE");
        then.status(200).json_body(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }));
    });

    let err = provider(&server)
        .fetch_price_history(&FetchRequest::new("NOPE", d(2024, 1, 1), d(2024, 1, 10)))
        .unwrap_err();
    assert!(
        matches!(&err, ProviderError::Api { message, .. } if message.contains("delisted")),
        "got {err:?}"
    );
}

#[test]
fn not_found_status_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/NOPE");
        then.status(404).json_body(json!({"chart": {"result": null, "error": {"code": "Not Found"}}}));
    });

    let err = provider(&server)
        .fetch_price_history(&FetchRequest::new("NOPE", d(2024, 1, 1), d(2024, 1, 10)))
        .unwrap_err();
    assert_eq!(err, ProviderError::Http { status: 404 });
}

#[test]
fn result_without_timestamps_is_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/2330.TW");
        then.status(200).json_body(json!({
            "chart": {"result": [{"meta": {}, "indicators": {"quote": [{}]}}], "error": null}
        }));
    });

    let err = provider(&server)
        .fetch_price_history(&FetchRequest::new("2330.TW", d(2024, 1, 1), d(2024, 1, 10)))
        .unwrap_err();
    assert_eq!(err, ProviderError::Empty);
}

#[test]
fn overflowing_timestamps_drop_as_bad_dates() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/2330.TW");
        then.status(200).json_body(json!({
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": 28800},
                    "timestamp": [i64::MAX, 1704157200, 1704243600, 1704330000],
                    "indicators": {"quote": [{
                        "open":  [1.0, 590.0, 584.0, 585.0],
                        "close": [1.0, 593.0, 586.0, 581.0]
                    }]}
                }],
                "error": null
            }
        }));
    });

    let series = provider(&server)
        .fetch_price_history(&FetchRequest::new("2330.TW", d(2024, 1, 1), d(2024, 1, 10)))
        .expect("valid sessions survive");
    assert_eq!(series.len(), 3);
    assert_eq!(series.first_date(), Some(d(2024, 1, 2)));
}

#[test]
fn only_overflowing_timestamps_is_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/2330.TW");
        then.status(200).json_body(json!({
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": 28800},
                    "timestamp": [i64::MAX, i64::MIN],
                    "indicators": {"quote": [{"open": [1.0, 1.0], "close": [1.0, 1.0]}]}
                }],
                "error": null
            }
        }));
    });

    let err = provider(&server)
        .fetch_price_history(&FetchRequest::new("2330.TW", d(2024, 1, 1), d(2024, 1, 10)))
        .unwrap_err();
    assert_eq!(err, ProviderError::Empty);
}
