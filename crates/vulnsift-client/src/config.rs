// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the scanning-service client.

use std::time::Duration;

use crate::error::{ApiError, Result};

/// Default inventory page size.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
/// Fixed delay between 429 retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);
/// Retry budget for 429 responses across one inventory listing.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the [`ScanApiClient`](crate::ScanApiClient).
#[derive(Debug, Clone)]
pub struct ScanApiConfig {
    /// Base URL of the scanning service, e.g. `https://secure.example.com`.
    /// A bare authority is accepted and prefixed with `https://`.
    pub base_url: String,
    /// Bearer token sent on every request.
    pub api_token: String,
    /// Inventory page size.
    pub page_size: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Delay between 429 retries.
    pub retry_delay: Duration,
    /// Maximum 429 retries per inventory listing.
    pub max_retries: u32,
    /// Interval between report status polls.
    pub poll_interval: Duration,
}

impl ScanApiConfig {
    /// Create a configuration with default tuning.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            api_token: api_token.into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(300),
            retry_delay: DEFAULT_RETRY_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            poll_interval: Duration::from_secs(30),
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `VULNSIFT_API_URL`: Base URL or authority of the scanning service (required)
    /// - `VULNSIFT_API_TOKEN`: Bearer token (required)
    /// - `VULNSIFT_PAGE_SIZE`: Inventory page size (default: 1000)
    /// - `VULNSIFT_REQUEST_TIMEOUT_MS`: Per-request timeout in milliseconds (default: 300000)
    /// - `VULNSIFT_RETRY_DELAY_MS`: Delay between 429 retries in milliseconds (default: 60000)
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_overrides(None, None)
    }

    /// Like [`ScanApiConfig::from_env`], but a caller-supplied base URL or
    /// token takes precedence and the corresponding variable is then not
    /// required. Tuning variables still apply either way.
    pub fn from_env_with_overrides(
        base_url: Option<&str>,
        api_token: Option<&str>,
    ) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url.to_string(),
            None => std::env::var("VULNSIFT_API_URL")
                .map_err(|_| ApiError::Config("VULNSIFT_API_URL is not set".to_string()))?,
        };
        let api_token = match api_token {
            Some(token) => token.to_string(),
            None => std::env::var("VULNSIFT_API_TOKEN")
                .map_err(|_| ApiError::Config("VULNSIFT_API_TOKEN is not set".to_string()))?,
        };

        let mut config = Self::new(base_url, api_token);

        if let Ok(raw) = std::env::var("VULNSIFT_PAGE_SIZE") {
            config.page_size = raw
                .parse()
                .map_err(|e| ApiError::Config(format!("invalid VULNSIFT_PAGE_SIZE: {e}")))?;
        }
        if let Ok(raw) = std::env::var("VULNSIFT_REQUEST_TIMEOUT_MS") {
            let ms: u64 = raw
                .parse()
                .map_err(|e| ApiError::Config(format!("invalid VULNSIFT_REQUEST_TIMEOUT_MS: {e}")))?;
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Ok(raw) = std::env::var("VULNSIFT_RETRY_DELAY_MS") {
            let ms: u64 = raw
                .parse()
                .map_err(|e| ApiError::Config(format!("invalid VULNSIFT_RETRY_DELAY_MS: {e}")))?;
            config.retry_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Set the inventory page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the delay between 429 retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the 429 retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the report status poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn normalize_base_url(raw: String) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
