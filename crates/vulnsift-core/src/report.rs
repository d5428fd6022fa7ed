// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Streaming reader for the bulk vulnerability export.
//!
//! The export is line-delimited, comma-separated text with one header row.
//! Column order is not assumed: the reader maps columns by exact,
//! case-sensitive name and rejects the file up front if any required column
//! is missing. Values are split on `,` with no quoting or escaping - the
//! source format guarantees no embedded commas. That is a known limitation
//! of the format, not something to paper over with CSV quoting.
//!
//! Rows are produced lazily; the reader holds one row plus the header map
//! in memory. There is no seek or resume - restarting means reopening the
//! stream from the top.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use crate::error::{ReconcileError, Result};
use crate::intern::StringInterner;
use crate::key::CompositeKey;

/// Every column the export must carry, by exact name.
pub const REQUIRED_COLUMNS: [&str; 27] = [
    "Vulnerability ID",
    "Severity",
    "Package name",
    "Package version",
    "Package type",
    "Package path",
    "Image",
    "OS Name",
    "CVSS version",
    "CVSS score",
    "CVSS vector",
    "Vuln link",
    "Vuln Publish date",
    "Vuln Fix date",
    "Fix version",
    "Public Exploit",
    "K8S cluster name",
    "K8S namespace name",
    "K8S workload type",
    "K8S workload name",
    "K8S container name",
    "Image ID",
    "K8S POD count",
    "Package suggested fix",
    "In use",
    "Risk accepted",
    "NVD Vuln Publish date",
];

/// The key-bearing columns, in [`CompositeKey`] field order.
pub const KEY_COLUMNS: [&str; 7] = [
    "K8S cluster name",
    "K8S namespace name",
    "K8S workload type",
    "K8S workload name",
    "K8S container name",
    "Image",
    "Image ID",
];

/// Parsed header of one export: original column order plus a name-to-index
/// map. Shared by every record of the run via `Arc`.
#[derive(Debug)]
pub struct ReportSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    key_indices: [usize; 7],
}

impl ReportSchema {
    /// Parse and validate a header line.
    ///
    /// Fails with [`ReconcileError::MissingColumn`] naming the first absent
    /// required column. Columns beyond the required set are carried through
    /// untouched.
    pub fn parse(header: &str) -> Result<Self> {
        let columns: Vec<String> = header.split(',').map(str::to_owned).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            // First occurrence wins if a header name repeats.
            index.entry(name.clone()).or_insert(i);
        }

        for required in REQUIRED_COLUMNS {
            if !index.contains_key(required) {
                return Err(ReconcileError::MissingColumn {
                    column: required.to_owned(),
                });
            }
        }

        let mut key_indices = [0usize; 7];
        for (slot, name) in key_indices.iter_mut().zip(KEY_COLUMNS) {
            // Key columns are a subset of the required set, checked above.
            *slot = index[name];
        }

        Ok(Self {
            columns,
            index,
            key_indices,
        })
    }

    /// Column names in their original file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index of `name` in the row layout, if the column exists.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// The header line, reassembled in original order.
    pub fn header_line(&self) -> String {
        self.columns.join(",")
    }
}

/// One vulnerability-finding row.
///
/// Values are stored in header order. The key-bearing columns are interned,
/// so every row carrying the same cluster, namespace or image shares one
/// allocation; the remaining columns are stored as-is.
#[derive(Debug, Clone)]
pub struct ExportRecord {
    schema: Arc<ReportSchema>,
    values: Vec<Arc<str>>,
}

impl ExportRecord {
    /// Value of `column`, or `None` if the schema has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema.index_of(column).map(|i| &*self.values[i])
    }

    /// The schema this record was read under.
    pub fn schema(&self) -> &Arc<ReportSchema> {
        &self.schema
    }

    /// Derive the join key from the seven key-bearing columns.
    pub fn key(&self) -> CompositeKey {
        let [cluster, namespace, workload_type, workload_name, container, image, image_id] =
            self.schema.key_indices.map(|i| Arc::clone(&self.values[i]));
        CompositeKey::new(
            cluster,
            namespace,
            workload_type,
            workload_name,
            container,
            image,
            image_id,
        )
    }

    /// Reassemble the row as it will be written to an output file: the
    /// stored values, comma-joined, in original column order.
    pub fn to_output_line(&self) -> String {
        self.values
            .iter()
            .map(|v| &**v)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Streaming, line-oriented reader over a bulk export.
///
/// Construction consumes the header line and validates the schema; the
/// reader then yields one [`ExportRecord`] per non-empty line. Rows with
/// fewer fields than the header are padded with empty strings; surplus
/// trailing fields are dropped.
#[derive(Debug)]
pub struct ReportReader<R: BufRead> {
    lines: std::io::Lines<R>,
    schema: Arc<ReportSchema>,
    interner: StringInterner,
    rows_read: u64,
}

impl<R: BufRead> ReportReader<R> {
    /// Open a reader over `source`, consuming and validating the header.
    pub fn new(source: R) -> Result<Self> {
        let mut lines = source.lines();
        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(ReconcileError::EmptyReport),
        };
        let schema = Arc::new(ReportSchema::parse(&header)?);
        Ok(Self {
            lines,
            schema,
            interner: StringInterner::new(),
            rows_read: 0,
        })
    }

    /// The validated schema. Cheap to clone; needed to write output headers
    /// even when a partition is empty.
    pub fn schema(&self) -> Arc<ReportSchema> {
        Arc::clone(&self.schema)
    }

    /// Rows yielded so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Consume the reader, returning its interner for end-of-run stats.
    pub fn into_interner(self) -> StringInterner {
        self.interner
    }

    fn parse_row(&mut self, line: &str) -> ExportRecord {
        let mut parts = line.split(',');
        let values: Vec<Arc<str>> = (0..self.schema.columns.len())
            .map(|i| {
                let raw = parts.next().unwrap_or("");
                // Only key-bearing columns repeat across rows; the rest
                // (links, vectors, dates) are row-unique and would bloat the
                // pool without ever deduplicating.
                if self.schema.key_indices.contains(&i) {
                    self.interner.intern(raw)
                } else {
                    Arc::from(raw)
                }
            })
            .collect();
        ExportRecord {
            schema: Arc::clone(&self.schema),
            values,
        }
    }
}

impl<R: BufRead> Iterator for ReportReader<R> {
    type Item = Result<ExportRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    // A completely blank line carries no row (typically the
                    // trailing newline at end of file).
                    if line.is_empty() {
                        continue;
                    }
                    self.rows_read += 1;
                    return Some(Ok(self.parse_row(&line)));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
