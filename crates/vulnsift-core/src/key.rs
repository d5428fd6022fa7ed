// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The composite join key.
//!
//! Both sides of the reconciliation identify a running container by the
//! same seven fields. The report columns and the inventory labels must map
//! to these fields in the same order, or logically identical workloads will
//! never match ("K8S cluster name" on the report side is
//! `kubernetes.cluster.name` on the inventory side, and so on).

use std::sync::Arc;

/// Immutable 7-field identity tuple used as the join key.
///
/// Equality is ordinal string equality over all seven fields; the derived
/// `Hash` is a pure, field-order-sensitive function of the same values, so
/// equal keys always hash equally. Missing fields must be normalized to the
/// empty string by the caller before construction - the key itself performs
/// no normalization and no trimming (two fields differing only by
/// surrounding whitespace are not equal, faithful to the export format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    pub cluster: Arc<str>,
    pub namespace: Arc<str>,
    pub workload_type: Arc<str>,
    pub workload_name: Arc<str>,
    pub container: Arc<str>,
    pub image: Arc<str>,
    pub image_id: Arc<str>,
}

impl CompositeKey {
    /// Build a key from seven already-normalized field values.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cluster: Arc<str>,
        namespace: Arc<str>,
        workload_type: Arc<str>,
        workload_name: Arc<str>,
        container: Arc<str>,
        image: Arc<str>,
        image_id: Arc<str>,
    ) -> Self {
        Self {
            cluster,
            namespace,
            workload_type,
            workload_name,
            container,
            image,
            image_id,
        }
    }

    /// The 6-field subset (everything except the image identifier) used for
    /// the duplicate-workload observation. Two inventory entries sharing a
    /// workload key but differing in image id are flagged for the operator;
    /// matching itself always uses the full 7-field key.
    pub fn workload_key(&self) -> WorkloadKey {
        WorkloadKey {
            cluster: Arc::clone(&self.cluster),
            namespace: Arc::clone(&self.namespace),
            workload_type: Arc::clone(&self.workload_type),
            workload_name: Arc::clone(&self.workload_name),
            container: Arc::clone(&self.container),
            image: Arc::clone(&self.image),
        }
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}/{}/{}",
            self.cluster,
            self.namespace,
            self.workload_type,
            self.workload_name,
            self.container,
            self.image,
            self.image_id
        )
    }
}

/// The 6-field workload identity (composite key minus image id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadKey {
    pub cluster: Arc<str>,
    pub namespace: Arc<str>,
    pub workload_type: Arc<str>,
    pub workload_name: Arc<str>,
    pub container: Arc<str>,
    pub image: Arc<str>,
}

impl std::fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.cluster,
            self.namespace,
            self.workload_type,
            self.workload_name,
            self.container,
            self.image
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn key(fields: [&str; 7]) -> CompositeKey {
        CompositeKey::new(
            Arc::from(fields[0]),
            Arc::from(fields[1]),
            Arc::from(fields[2]),
            Arc::from(fields[3]),
            Arc::from(fields[4]),
            Arc::from(fields[5]),
            Arc::from(fields[6]),
        )
    }

    fn hash_of(k: &CompositeKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        k.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equality_is_symmetric_and_agrees_with_hash() {
        let a = key(["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        let b = key(["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        assert_eq!(a == b, b == a);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_any_single_field_difference_breaks_equality() {
        let base = ["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"];
        let a = key(base);
        for i in 0..7 {
            let mut fields = base;
            fields[i] = "other";
            assert_ne!(a, key(fields), "field {i} should participate in equality");
        }
    }

    #[test]
    fn test_field_positions_are_not_interchangeable() {
        // Same multiset of values, swapped between positions.
        let a = key(["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        let b = key(["web", "prod", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_whitespace_is_significant() {
        let a = key(["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        let b = key(["prod ", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_sentinel_matches_empty_sentinel() {
        let a = key(["prod", "web", "Deployment", "api", "app", "img:1", ""]);
        let b = key(["prod", "web", "Deployment", "api", "app", "img:1", ""]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_display_joins_all_seven_fields() {
        let k = key(["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        assert_eq!(k.to_string(), "prod/web/Deployment/api/app/img:1/sha256:aaa");
    }

    #[test]
    fn test_workload_key_ignores_image_id() {
        let a = key(["prod", "web", "Deployment", "api", "app", "img:1", "sha256:aaa"]);
        let b = key(["prod", "web", "Deployment", "api", "app", "img:1", "sha256:bbb"]);
        assert_ne!(a, b);
        assert_eq!(a.workload_key(), b.workload_key());
    }
}
