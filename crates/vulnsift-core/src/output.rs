// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Output writers for the three partitions.
//!
//! The primary and unmatched-export files share one schema: the export's
//! original column names, in their original order, then one comma-joined
//! row per record in stored (interned) string form. The unmatched-inventory
//! file is a fixed-column listing with a literal tag per row.
//!
//! Callers materialize all partitions before opening any file, so a failed
//! run never leaves behind a half-written primary output.

use std::io::Write;

use crate::report::{ExportRecord, ReportSchema};
use crate::runtime::RuntimeResultInfo;

/// Tag written as the first field of every unmatched-inventory row.
pub const UNMATCHED_INVENTORY_TAG: &str = "UNMATCHED_RUNTIME_RESULT";

/// Write the matched partition: original header, then one row per record.
pub fn write_matched<W: Write>(
    out: &mut W,
    schema: &ReportSchema,
    records: &[ExportRecord],
) -> std::io::Result<()> {
    write_report_rows(out, schema, records)
}

/// Write the unmatched-export partition. Same schema as the primary output.
pub fn write_unmatched_export<W: Write>(
    out: &mut W,
    schema: &ReportSchema,
    records: &[ExportRecord],
) -> std::io::Result<()> {
    write_report_rows(out, schema, records)
}

fn write_report_rows<W: Write>(
    out: &mut W,
    schema: &ReportSchema,
    records: &[ExportRecord],
) -> std::io::Result<()> {
    writeln!(out, "{}", schema.header_line())?;
    for record in records {
        writeln!(out, "{}", record.to_output_line())?;
    }
    out.flush()
}

/// Write the unmatched-inventory partition: tag, cluster, namespace,
/// workload type, workload name, container, image.
pub fn write_unmatched_inventory<W: Write>(
    out: &mut W,
    entries: &[RuntimeResultInfo],
) -> std::io::Result<()> {
    for entry in entries {
        writeln!(
            out,
            "{UNMATCHED_INVENTORY_TAG},{},{},{},{},{},{}",
            entry.cluster,
            entry.namespace,
            entry.workload_type,
            entry.workload_name,
            entry.container,
            entry.image
        )?;
    }
    out.flush()
}
