// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! ScanApiClient: paginated runtime inventory retrieval and report
//! schedule access.

use std::io::Read;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use vulnsift_core::RuntimeResultInfo;

use crate::config::ScanApiConfig;
use crate::error::{ApiError, Result};
use crate::types::{ReportSchedule, ResultsPage};

/// Fixed inventory filter: only workload-type assets carry the kubernetes
/// tuple the reconciliation joins on. Pre-encoded as the service expects it.
const WORKLOAD_FILTER: &str = "asset.type+%3D+'workload'";

const RESULTS_PATH: &str = "api/scanning/runtime/v2/workflows/results";
const SCHEDULES_PATH: &str = "api/scanning/reporting/v2/schedules";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Client for the scanning service's runtime inventory and report
/// schedule endpoints.
///
/// Every request carries the configured bearer token. Rate limiting (HTTP
/// 429) on the inventory listing is retried with a fixed delay up to the
/// configured budget; exhausting the budget aborts the run rather than
/// returning partial data. Any other non-success status is fatal
/// immediately.
#[derive(Debug)]
pub struct ScanApiClient {
    http: reqwest::Client,
    config: ScanApiConfig,
}

impl ScanApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ScanApiConfig) -> Result<Self> {
        if config.api_token.is_empty() {
            return Err(ApiError::Config("api token must not be empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ScanApiConfig::from_env()?)
    }

    /// The client configuration.
    pub fn config(&self) -> &ScanApiConfig {
        &self.config
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        Ok(self
            .http
            .get(url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await?)
    }

    fn results_url(&self, cursor: &str) -> String {
        format!(
            "{}/{RESULTS_PATH}?cursor={cursor}&filter={WORKLOAD_FILTER}&limit={}",
            self.config.base_url, self.config.page_size
        )
    }

    /// Retrieve the full runtime inventory, following the page cursor until
    /// the service reports no next page.
    ///
    /// The 429 retry budget spans the whole listing: the same request is
    /// re-sent after a fixed delay, and once the budget is spent the run
    /// fails with [`ApiError::RateLimitExceeded`]. A malformed element
    /// (missing label or asset field) fails the listing immediately.
    #[instrument(skip(self))]
    pub async fn list_runtime_results(&self) -> Result<Vec<RuntimeResultInfo>> {
        let mut results = Vec::new();
        let mut cursor = String::new();
        let mut retries = 0u32;
        let mut pages = 0u32;

        loop {
            let url = self.results_url(&cursor);
            debug!(page = pages, "requesting runtime inventory page");

            let response = self.get(&url).await?;
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.config.max_retries {
                    return Err(ApiError::RateLimitExceeded { retries });
                }
                retries += 1;
                warn!(
                    retry = retries,
                    budget = self.config.max_retries,
                    delay_ms = self.config.retry_delay.as_millis() as u64,
                    "rate limited, retrying the same page"
                );
                tokio::time::sleep(self.config.retry_delay).await;
                continue;
            }

            let response = fail_on_status(response).await?;
            let body = response.bytes().await?;
            let page: ResultsPage = serde_json::from_slice(&body)?;
            pages += 1;

            for element in page.data {
                results.push(element.into_runtime_result()?);
            }

            match page.page.and_then(|p| p.next) {
                Some(next) if !next.is_empty() => cursor = next,
                _ => break,
            }
        }

        info!(entries = results.len(), pages, "runtime inventory retrieved");
        Ok(results)
    }

    /// Fetch the status of a scheduled report.
    #[instrument(skip(self), fields(report_id = %report_id))]
    pub async fn report_status(&self, report_id: &str) -> Result<ReportSchedule> {
        let url = format!("{}/{SCHEDULES_PATH}/{report_id}", self.config.base_url);
        let response = fail_on_status(self.get(&url).await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Timestamp of the report's last completed generation, if any.
    pub async fn last_completed_at(&self, report_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.report_status(report_id).await?.report_last_completed_at)
    }

    /// Poll the report schedule until a generation completes after `since`
    /// (or until any completed generation exists, when `since` is `None`).
    ///
    /// Gives up with [`ApiError::ReportTimeout`] once `timeout` elapses.
    #[instrument(skip(self), fields(report_id = %report_id))]
    pub async fn wait_for_report(
        &self,
        report_id: &str,
        since: Option<DateTime<Utc>>,
        timeout: std::time::Duration,
    ) -> Result<DateTime<Utc>> {
        let started = tokio::time::Instant::now();
        loop {
            let completed = self.last_completed_at(report_id).await?;
            match (completed, since) {
                (Some(ts), None) => return Ok(ts),
                (Some(ts), Some(baseline)) if ts > baseline => return Ok(ts),
                _ => {}
            }

            if started.elapsed() >= timeout {
                return Err(ApiError::ReportTimeout {
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            debug!("report not ready, polling again");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Download the bulk export for a report, returning the decompressed
    /// bytes. Bodies without the gzip magic are passed through unchanged
    /// (the service omits compression for small reports).
    #[instrument(skip(self), fields(report_id = %report_id))]
    pub async fn download_report(&self, report_id: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/{SCHEDULES_PATH}/{report_id}/download",
            self.config.base_url
        );
        info!("downloading report");

        let response = fail_on_status(self.get(&url).await?).await?;
        let compressed = response.bytes().await?;

        if !compressed.starts_with(&GZIP_MAGIC) {
            info!(bytes = compressed.len(), "report was not compressed");
            return Ok(compressed.to_vec());
        }

        let mut decoder = GzDecoder::new(compressed.as_ref());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;
        info!(
            compressed_bytes = compressed.len(),
            decompressed_bytes = decompressed.len(),
            "report downloaded"
        );
        Ok(decompressed)
    }
}

/// Map any non-success status to a fatal transport error, preserving as
/// much of the body as can be read.
async fn fail_on_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_else(|_| String::new());
    Err(ApiError::Transport {
        status: status.as_u16(),
        body,
    })
}
