// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Wire types for the scanning-service API.
//!
//! Responses are decoded into explicit structs once, so a missing nested
//! field is a typed error at the decode boundary instead of a null
//! dereference deep inside the matching pass.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use vulnsift_core::RuntimeResultInfo;

use crate::error::{ApiError, Result};

/// Inventory label keys, by fixed path.
pub(crate) const LABEL_CLUSTER: &str = "kubernetes.cluster.name";
pub(crate) const LABEL_NAMESPACE: &str = "kubernetes.namespace.name";
pub(crate) const LABEL_WORKLOAD_TYPE: &str = "kubernetes.workload.type";
pub(crate) const LABEL_WORKLOAD_NAME: &str = "kubernetes.workload.name";
pub(crate) const LABEL_CONTAINER: &str = "kubernetes.pod.container.name";

/// One page of the runtime inventory listing.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultsPage {
    #[serde(default)]
    pub data: Vec<ResultEntry>,
    pub page: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    pub next: Option<String>,
}

/// One element of a results page.
#[derive(Debug, Deserialize)]
pub(crate) struct ResultEntry {
    #[serde(rename = "resourceId")]
    pub resource_id: Option<String>,
    #[serde(rename = "resultId")]
    pub result_id: Option<String>,
    #[serde(rename = "recordDetails")]
    pub record_details: Option<RecordDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordDetails {
    #[serde(rename = "mainAssetName")]
    pub main_asset_name: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl ResultEntry {
    /// Convert a wire element into a runtime inventory entry, failing fast
    /// on any missing field that feeds the join key.
    pub(crate) fn into_runtime_result(self) -> Result<RuntimeResultInfo> {
        let details = self
            .record_details
            .ok_or_else(|| missing("recordDetails"))?;

        let label = |key: &str| -> Result<String> {
            details
                .labels
                .get(key)
                .cloned()
                .ok_or_else(|| missing(&format!("recordDetails.labels.{key}")))
        };

        Ok(RuntimeResultInfo {
            cluster: label(LABEL_CLUSTER)?,
            namespace: label(LABEL_NAMESPACE)?,
            workload_type: label(LABEL_WORKLOAD_TYPE)?,
            workload_name: label(LABEL_WORKLOAD_NAME)?,
            container: label(LABEL_CONTAINER)?,
            image: details
                .main_asset_name
                .ok_or_else(|| missing("recordDetails.mainAssetName"))?,
            image_id: self.resource_id.ok_or_else(|| missing("resourceId"))?,
            result_id: self.result_id,
        })
    }
}

fn missing(path: &str) -> ApiError {
    ApiError::MalformedResponse(format!("missing field {path}"))
}

/// Status of a scheduled report, as returned by the schedules endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSchedule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub schedule_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub report_format: Option<String>,
    #[serde(default)]
    pub compression: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub report_last_completed_at: Option<DateTime<Utc>>,
}
