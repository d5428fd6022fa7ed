// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Run-scoped string interner.
//!
//! The bulk report repeats the same cluster, namespace and image strings
//! across millions of rows. Interning collapses every distinct value to a
//! single shared `Arc<str>` so that record storage and composite keys cost
//! one pointer per field instead of one allocation per row.
//!
//! The pool never evicts: a value once stored is canonical for the rest of
//! the run. The whole interner is dropped with the run, arena-style. It is
//! deliberately not `Sync`; ingestion is single-threaded.

use std::collections::HashSet;
use std::sync::Arc;

/// Maps every distinct string value to one canonical `Arc<str>` instance.
#[derive(Debug, Default)]
pub struct StringInterner {
    pool: HashSet<Arc<str>>,
}

impl StringInterner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical instance for `value`, inserting it on first use.
    ///
    /// Two calls with equal input return clones of the same allocation.
    pub fn intern(&mut self, value: &str) -> Arc<str> {
        if let Some(existing) = self.pool.get(value) {
            return Arc::clone(existing);
        }
        let canonical: Arc<str> = Arc::from(value);
        self.pool.insert(Arc::clone(&canonical));
        canonical
    }

    /// Number of distinct values stored so far.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// True if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
