// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for vulnsift-core.

use thiserror::Error;

/// Result type using ReconcileError.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors that can occur while ingesting the bulk report or reconciling it
/// against the runtime inventory.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The bulk report header is missing a required column. Raised before
    /// any row is parsed and before any matching work begins.
    #[error("bulk report is missing required column \"{column}\"")]
    MissingColumn {
        /// The exact column name that was absent from the header line.
        column: String,
    },

    /// The bulk report contained no header line at all.
    #[error("bulk report is empty: no header line")]
    EmptyReport,

    /// I/O failure while reading the report stream or writing an output.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
