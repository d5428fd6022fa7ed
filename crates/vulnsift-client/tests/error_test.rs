// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error display and conversion tests.

use vulnsift_client::ApiError;

#[test]
fn test_config_error_display() {
    let err = ApiError::Config("api token must not be empty".to_string());
    assert_eq!(
        err.to_string(),
        "configuration error: api token must not be empty"
    );
}

#[test]
fn test_transport_error_display_includes_status_and_body() {
    let err = ApiError::Transport {
        status: 503,
        body: "service unavailable".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "transport error: HTTP 503: service unavailable"
    );
}

#[test]
fn test_rate_limit_display_names_the_retry_count() {
    let err = ApiError::RateLimitExceeded { retries: 3 };
    assert_eq!(err.to_string(), "rate limited: gave up after 3 retries");
}

#[test]
fn test_report_timeout_display() {
    let err = ApiError::ReportTimeout { waited_secs: 120 };
    assert_eq!(err.to_string(), "report generation timed out after 120s");
}

#[test]
fn test_malformed_response_display() {
    let err = ApiError::MalformedResponse(
        "missing field recordDetails.labels.kubernetes.cluster.name".to_string(),
    );
    assert!(err.to_string().starts_with("malformed inventory response:"));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated gzip stream");
    let err = ApiError::from(io);
    assert!(matches!(err, ApiError::Io(_)));
    assert!(err.to_string().contains("truncated gzip stream"));
}

#[test]
fn test_decode_error_converts() {
    let decode = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let err = ApiError::from(decode);
    assert!(matches!(err, ApiError::Decode(_)));
}
