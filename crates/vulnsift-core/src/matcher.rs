// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The matching pass: partitions inventory and export into matched and
//! unmatched sets.
//!
//! Matching runs strictly after the index is fully built. For every
//! inventory entry, in input order, the entry's composite key is claimed in
//! the index:
//!
//! - first claim: every record under the key goes to `matched`, in stored
//!   order;
//! - already consumed (a duplicate inventory entry with the same key): the
//!   rows were reported once and are not emitted again, and the entry is
//!   not recorded as unmatched either - it does correspond to live data;
//! - absent: the entry goes to `unmatched_inventory`.
//!
//! Afterwards every record in a never-claimed bucket becomes
//! `unmatched_export`.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::index::{Claim, ReconciliationIndex};
use crate::key::WorkloadKey;
use crate::report::ExportRecord;
use crate::runtime::RuntimeResultInfo;

const PROGRESS_INTERVAL: usize = 1000;

/// Counters accumulated by one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Inventory entries processed.
    pub entries_processed: usize,
    /// Inventory entries whose 6-field workload identity (everything except
    /// image id) is shared with at least one other entry. Operator
    /// visibility only; matching always uses the full 7-field key.
    pub duplicate_workloads: usize,
    /// Inventory entries whose full key was already claimed by an earlier
    /// entry.
    pub repeated_keys: usize,
    /// Export rows emitted to the matched partition.
    pub matched_rows: usize,
    /// Inventory entries with no matching export rows.
    pub unmatched_inventory: usize,
    /// Export rows with no matching inventory entry.
    pub unmatched_export_rows: usize,
}

/// The three-way partition plus run counters.
#[derive(Debug)]
pub struct Reconciliation {
    pub matched: Vec<ExportRecord>,
    pub unmatched_inventory: Vec<RuntimeResultInfo>,
    pub unmatched_export: Vec<ExportRecord>,
    pub stats: ReconcileStats,
}

/// Reconcile the runtime inventory against a fully built index.
///
/// Consumes the index; the claim markers it accumulates are what derive the
/// unmatched-export partition.
pub fn reconcile(
    inventory: Vec<RuntimeResultInfo>,
    mut index: ReconciliationIndex,
) -> Reconciliation {
    let mut stats = ReconcileStats {
        duplicate_workloads: observe_duplicates(&inventory),
        ..ReconcileStats::default()
    };

    let mut matched = Vec::new();
    let mut unmatched_inventory = Vec::new();

    for entry in inventory {
        stats.entries_processed += 1;
        if stats.entries_processed % PROGRESS_INTERVAL == 0 {
            info!(processed = stats.entries_processed, "matching in progress");
        }

        let key = entry.key();
        match index.claim(&key) {
            Claim::Matched(mut records) => {
                stats.matched_rows += records.len();
                matched.append(&mut records);
            }
            Claim::AlreadyConsumed => {
                stats.repeated_keys += 1;
            }
            Claim::Absent => {
                debug!(key = %key, "running workload has no report rows");
                unmatched_inventory.push(entry);
            }
        }
    }

    let unmatched_export = index.drain_unclaimed();
    stats.unmatched_inventory = unmatched_inventory.len();
    stats.unmatched_export_rows = unmatched_export.len();

    info!(
        entries = stats.entries_processed,
        matched_rows = stats.matched_rows,
        unmatched_inventory = stats.unmatched_inventory,
        unmatched_export_rows = stats.unmatched_export_rows,
        "reconciliation complete"
    );

    Reconciliation {
        matched,
        unmatched_inventory,
        unmatched_export,
        stats,
    }
}

/// Count and log inventory entries sharing a 6-field workload identity.
/// Side observation only; never gates matching.
fn observe_duplicates(inventory: &[RuntimeResultInfo]) -> usize {
    let mut groups: HashMap<WorkloadKey, usize> = HashMap::new();
    for entry in inventory {
        *groups.entry(entry.key().workload_key()).or_insert(0) += 1;
    }

    let mut duplicates = 0;
    for (key, count) in &groups {
        if *count > 1 {
            duplicates += count;
            warn!(workload = %key, count, "duplicate workload identity in inventory");
        }
    }
    if duplicates == 0 {
        info!("no duplicate workload identities in inventory");
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{KEY_COLUMNS, REQUIRED_COLUMNS, ReportReader};
    use std::io::Cursor;

    fn export(rows: &[([&str; 7], &str)]) -> Vec<ExportRecord> {
        let header = REQUIRED_COLUMNS.join(",");
        let mut data = format!("{header}\n");
        for (key, vuln_id) in rows {
            let mut fields = vec![""; REQUIRED_COLUMNS.len()];
            fields[0] = vuln_id;
            for (name, value) in KEY_COLUMNS.iter().zip(*key) {
                let idx = REQUIRED_COLUMNS.iter().position(|c| c == name).unwrap();
                fields[idx] = value;
            }
            data.push_str(&fields.join(","));
            data.push('\n');
        }
        ReportReader::new(Cursor::new(data))
            .unwrap()
            .collect::<crate::Result<_>>()
            .unwrap()
    }

    fn entry(key: [&str; 7]) -> RuntimeResultInfo {
        RuntimeResultInfo {
            cluster: key[0].into(),
            namespace: key[1].into(),
            workload_type: key[2].into(),
            workload_name: key[3].into(),
            container: key[4].into(),
            image: key[5].into(),
            image_id: key[6].into(),
            result_id: None,
        }
    }

    const PROD: [&str; 7] = ["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"];
    const STAGING: [&str; 7] = ["prod", "staging", "Deployment", "api", "app", "img:1", "sha256:aaa"];

    fn vuln_ids(records: &[ExportRecord]) -> Vec<&str> {
        records
            .iter()
            .map(|r| r.get("Vulnerability ID").unwrap())
            .collect()
    }

    #[test]
    fn test_single_workload_two_findings_one_stray_row() {
        // The worked example: one running workload, two report rows sharing
        // its exact tuple, one row in a different namespace.
        let records = export(&[(PROD, "CVE-1"), (PROD, "CVE-2"), (STAGING, "CVE-3")]);
        let index = ReconciliationIndex::build(records);

        let result = reconcile(vec![entry(PROD)], index);
        assert_eq!(vuln_ids(&result.matched), ["CVE-1", "CVE-2"]);
        assert!(result.unmatched_inventory.is_empty());
        assert_eq!(vuln_ids(&result.unmatched_export), ["CVE-3"]);
        assert_eq!(result.stats.matched_rows, 2);
        assert_eq!(result.stats.unmatched_export_rows, 1);
    }

    #[test]
    fn test_inventory_entry_without_findings_is_unmatched() {
        let records = export(&[(PROD, "CVE-1")]);
        let index = ReconciliationIndex::build(records);

        let other = ["dev", "web", "Deployment", "api", "app", "img:1", "sha256:ccc"];
        let result = reconcile(vec![entry(other)], index);
        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched_inventory.len(), 1);
        assert_eq!(result.unmatched_inventory[0].cluster, "dev");
        assert_eq!(vuln_ids(&result.unmatched_export), ["CVE-1"]);
    }

    #[test]
    fn test_duplicate_inventory_key_emits_rows_once() {
        let records = export(&[(PROD, "CVE-1"), (PROD, "CVE-2")]);
        let index = ReconciliationIndex::build(records);

        let result = reconcile(vec![entry(PROD), entry(PROD)], index);
        // Rows come out exactly once; the duplicate is neither re-matched
        // nor reported as unmatched inventory.
        assert_eq!(vuln_ids(&result.matched), ["CVE-1", "CVE-2"]);
        assert!(result.unmatched_inventory.is_empty());
        assert_eq!(result.stats.repeated_keys, 1);
        assert_eq!(result.stats.entries_processed, 2);
    }

    #[test]
    fn test_duplicate_workload_observation_does_not_gate_matching() {
        // Same 6-field identity, different image ids: flagged as duplicates
        // but matched independently on the full key.
        let variant = ["prod", "web", "Deployment", "api", "app", "img:1", "sha256:bbb"];
        let records = export(&[(PROD, "CVE-1"), (variant, "CVE-2")]);
        let index = ReconciliationIndex::build(records);

        let result = reconcile(vec![entry(PROD), entry(variant)], index);
        assert_eq!(result.stats.duplicate_workloads, 2);
        assert_eq!(vuln_ids(&result.matched), ["CVE-1", "CVE-2"]);
        assert!(result.unmatched_inventory.is_empty());
    }

    #[test]
    fn test_empty_inventory_leaves_everything_unmatched() {
        let records = export(&[(PROD, "CVE-1"), (STAGING, "CVE-2")]);
        let index = ReconciliationIndex::build(records);

        let result = reconcile(Vec::new(), index);
        assert!(result.matched.is_empty());
        assert_eq!(vuln_ids(&result.unmatched_export), ["CVE-1", "CVE-2"]);
        assert_eq!(result.stats.entries_processed, 0);
    }

    #[test]
    fn test_reconcile_is_deterministic_across_identical_runs() {
        let rows = [(PROD, "CVE-1"), (PROD, "CVE-2"), (STAGING, "CVE-3")];
        let inventory = || vec![entry(PROD), entry(STAGING)];

        let first = reconcile(inventory(), ReconciliationIndex::build(export(&rows)));
        let second = reconcile(inventory(), ReconciliationIndex::build(export(&rows)));

        assert_eq!(vuln_ids(&first.matched), vuln_ids(&second.matched));
        assert_eq!(
            vuln_ids(&first.unmatched_export),
            vuln_ids(&second.unmatched_export)
        );
        assert_eq!(first.stats, second.stats);
    }
}
