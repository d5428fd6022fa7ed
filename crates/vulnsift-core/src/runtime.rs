// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runtime inventory entries.

use std::sync::Arc;

use crate::key::CompositeKey;

/// One running workload instance from the scanning service's runtime
/// inventory.
///
/// Carries the same seven logical fields as [`CompositeKey`] plus the
/// opaque result identifier assigned by the source service. The result id
/// is an implementation detail of that service and never participates in
/// the join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeResultInfo {
    pub cluster: String,
    pub namespace: String,
    pub workload_type: String,
    pub workload_name: String,
    pub container: String,
    pub image: String,
    pub image_id: String,
    /// Opaque per-result identifier from the source service; not part of
    /// the join key.
    pub result_id: Option<String>,
}

impl RuntimeResultInfo {
    /// Derive the join key for this entry.
    ///
    /// Field mapping mirrors [`crate::report::KEY_COLUMNS`] on the report
    /// side; the two must stay in lockstep or no workload will ever match.
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(
            Arc::from(self.cluster.as_str()),
            Arc::from(self.namespace.as_str()),
            Arc::from(self.workload_type.as_str()),
            Arc::from(self.workload_name.as_str()),
            Arc::from(self.container.as_str()),
            Arc::from(self.image.as_str()),
            Arc::from(self.image_id.as_str()),
        )
    }
}
