// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Vulnsift Client
//!
//! HTTP client for the scanning service consumed by the vulnsift
//! reconciliation pipeline, plus the `vulnsift` CLI binary.
//!
//! Two surfaces are covered:
//!
//! - the **runtime inventory** listing (cursor-paginated, rate-limit aware),
//!   yielding one [`vulnsift_core::RuntimeResultInfo`] per running
//!   container, and
//! - the **report schedule** endpoints: status, completion polling, and the
//!   gzip-compressed bulk export download.
//!
//! # Example
//!
//! ```no_run
//! use vulnsift_client::{ScanApiClient, ScanApiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ScanApiClient::new(ScanApiConfig::new("secure.example.com", "token"))?;
//!
//! let report = client.download_report("report-42").await?;
//! let inventory = client.list_runtime_results().await?;
//! println!("{} bytes of report, {} running workloads", report.len(), inventory.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::ScanApiClient;
pub use config::{DEFAULT_MAX_RETRIES, DEFAULT_PAGE_SIZE, DEFAULT_RETRY_DELAY, ScanApiConfig};
pub use error::{ApiError, Result};
pub use types::ReportSchedule;
