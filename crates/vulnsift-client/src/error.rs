// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for vulnsift-client.

use thiserror::Error;

/// Result type using ApiError.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur when talking to the scanning service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The service answered with a non-success status other than 429.
    /// Fatal; never retried.
    #[error("transport error: HTTP {status}: {body}")]
    Transport {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The 429 retry budget was exhausted. The run must abort rather than
    /// return partial inventory data.
    #[error("rate limited: gave up after {retries} retries")]
    RateLimitExceeded {
        /// Retries performed before giving up.
        retries: u32,
    },

    /// An inventory element was missing an expected nested field. Fatal:
    /// silently defaulting a key field would corrupt the join.
    #[error("malformed inventory response: {0}")]
    MalformedResponse(String),

    /// The report did not complete within the polling window.
    #[error("report generation timed out after {waited_secs}s")]
    ReportTimeout {
        /// Seconds spent polling before giving up.
        waited_secs: u64,
    },

    /// Network-level failure from the HTTP client.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// I/O failure (for example while decompressing a report download).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
