// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Vulnsift Core - Workload/Vulnerability Reconciliation Engine
//!
//! This crate joins two independently produced views of the same container
//! fleet:
//!
//! - the **runtime inventory**: every running container, identified by a
//!   cluster / namespace / workload type / workload name / container /
//!   image / image-id tuple (see [`RuntimeResultInfo`]), and
//! - the **bulk vulnerability report**: a large comma-delimited export
//!   where each row carries the same tuple plus per-package finding data
//!   (see [`ExportRecord`]).
//!
//! The engine streams the report through [`ReportReader`] (header-driven
//! column mapping, interned string storage), groups rows by
//! [`CompositeKey`] into a [`ReconciliationIndex`], and [`reconcile`]s the
//! inventory against it, producing three partitions:
//!
//! 1. **matched** - vulnerability rows that apply to a running workload,
//! 2. **unmatched inventory** - running workloads with no report data,
//! 3. **unmatched export** - report rows with no running workload.
//!
//! Network retrieval of both inputs lives in `vulnsift-client`; this crate
//! performs no I/O beyond reading the byte stream it is handed and writing
//! the output partitions.

pub mod error;
pub mod index;
pub mod intern;
pub mod key;
pub mod matcher;
pub mod output;
pub mod report;
pub mod runtime;

pub use error::{ReconcileError, Result};
pub use index::{Claim, ReconciliationIndex};
pub use intern::StringInterner;
pub use key::CompositeKey;
pub use matcher::{Reconciliation, ReconcileStats, reconcile};
pub use report::{ExportRecord, KEY_COLUMNS, REQUIRED_COLUMNS, ReportReader, ReportSchema};
pub use runtime::RuntimeResultInfo;
