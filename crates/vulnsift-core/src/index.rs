// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Composite-key index over the export records.
//!
//! Built once per run before matching starts; matching against a
//! half-built index is not a supported mode. Buckets are claimed rather
//! than removed: a claimed bucket stays in the map with a consumed marker,
//! so "present but already reported" is distinguishable from "never present"
//! and the data flow stays auditable.

use std::collections::HashMap;

use crate::key::CompositeKey;
use crate::report::ExportRecord;

/// Outcome of claiming a key during matching.
#[derive(Debug)]
pub enum Claim {
    /// First claim of the key: all records stored under it, in arrival
    /// order. The bucket is now marked consumed.
    Matched(Vec<ExportRecord>),
    /// The key was present but a previous claim already consumed it.
    AlreadyConsumed,
    /// The key never appeared in the export.
    Absent,
}

#[derive(Debug, Default)]
struct Bucket {
    records: Vec<ExportRecord>,
    consumed: bool,
}

/// Grouping of export records by composite key, with O(1) average lookup
/// per inventory entry.
#[derive(Debug, Default)]
pub struct ReconciliationIndex {
    buckets: HashMap<CompositeKey, Bucket>,
    /// First-seen order of keys, so the unmatched-export partition comes
    /// out deterministic.
    order: Vec<CompositeKey>,
    record_count: usize,
}

impl ReconciliationIndex {
    /// Build the index from the full export, preserving arrival order
    /// within each key. O(n) time and space; no sorting.
    pub fn build(records: impl IntoIterator<Item = ExportRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            let key = record.key();
            let bucket = index.buckets.entry(key.clone()).or_insert_with(|| {
                index.order.push(key);
                Bucket::default()
            });
            bucket.records.push(record);
            index.record_count += 1;
        }
        index
    }

    /// Total records indexed at build time.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Distinct composite keys in the index.
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// Non-consuming lookup of the records stored under `key`.
    ///
    /// Returns `None` for both absent and already-claimed keys; use
    /// [`ReconciliationIndex::claim`] during matching.
    pub fn lookup(&self, key: &CompositeKey) -> Option<&[ExportRecord]> {
        self.buckets
            .get(key)
            .filter(|b| !b.consumed)
            .map(|b| b.records.as_slice())
    }

    /// Claim `key`: the first claim takes the bucket's records and marks it
    /// consumed; later claims of the same key report [`Claim::AlreadyConsumed`].
    pub fn claim(&mut self, key: &CompositeKey) -> Claim {
        match self.buckets.get_mut(key) {
            Some(bucket) if bucket.consumed => Claim::AlreadyConsumed,
            Some(bucket) => {
                bucket.consumed = true;
                Claim::Matched(std::mem::take(&mut bucket.records))
            }
            None => Claim::Absent,
        }
    }

    /// Drain every record that was never claimed, in first-seen key order.
    /// These are the export rows with no corresponding running workload.
    pub fn drain_unclaimed(&mut self) -> Vec<ExportRecord> {
        let mut unclaimed = Vec::new();
        for key in &self.order {
            if let Some(bucket) = self.buckets.get_mut(key) {
                if !bucket.consumed {
                    bucket.consumed = true;
                    unclaimed.append(&mut bucket.records);
                }
            }
        }
        unclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{KEY_COLUMNS, REQUIRED_COLUMNS, ReportReader};
    use std::io::Cursor;

    fn records(rows: &[([&str; 7], &str)]) -> Vec<ExportRecord> {
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

    const KEY_A: [&str; 7] = ["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"];
    const KEY_B: [&str; 7] = ["prod", "db", "StatefulSet", "pg", "pg", "img:2", "sha256:bbb"];

    #[test]
    fn test_build_groups_by_key_preserving_arrival_order() {
        let recs = records(&[(KEY_A, "CVE-1"), (KEY_B, "CVE-2"), (KEY_A, "CVE-3")]);
        let key = recs[0].key();
        let index = ReconciliationIndex::build(recs);
        assert_eq!(index.record_count(), 3);
        assert_eq!(index.key_count(), 2);

        let stored = index.lookup(&key).unwrap();
        let ids: Vec<_> = stored
            .iter()
            .map(|r| r.get("Vulnerability ID").unwrap())
            .collect();
        assert_eq!(ids, ["CVE-1", "CVE-3"]);
    }

    #[test]
    fn test_first_claim_takes_records_second_sees_consumed() {
        let recs = records(&[(KEY_A, "CVE-1"), (KEY_A, "CVE-2")]);
        let key = recs[0].key();
        let mut index = ReconciliationIndex::build(recs);

        match index.claim(&key) {
            Claim::Matched(taken) => assert_eq!(taken.len(), 2),
            other => panic!("expected Matched, got {other:?}"),
        }
        assert!(matches!(index.claim(&key), Claim::AlreadyConsumed));
        assert!(index.lookup(&key).is_none());
    }

    #[test]
    fn test_unknown_key_is_absent() {
        let recs = records(&[(KEY_A, "CVE-1")]);
        let mut index = ReconciliationIndex::build(recs);
        let other = records(&[(KEY_B, "CVE-9")])[0].key();
        assert!(matches!(index.claim(&other), Claim::Absent));
    }

    #[test]
    fn test_drain_unclaimed_skips_claimed_buckets_and_keeps_order() {
        let recs = records(&[(KEY_A, "CVE-1"), (KEY_B, "CVE-2"), (KEY_B, "CVE-3")]);
        let claimed = recs[0].key();
        let mut index = ReconciliationIndex::build(recs);
        index.claim(&claimed);

        let leftover = index.drain_unclaimed();
        let ids: Vec<_> = leftover
            .iter()
            .map(|r| r.get("Vulnerability ID").unwrap())
            .collect();
        assert_eq!(ids, ["CVE-2", "CVE-3"]);

        // Draining twice yields nothing new.
        assert!(index.drain_unclaimed().is_empty());
    }
}
