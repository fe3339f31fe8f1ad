// ⚖️ Set Reconciliation Engine
// One routine shared by every validator: compare the key sets of two related
// collections and classify each one-sided difference as blocking or
// informational.
//
// A blocking difference is a data-integrity violation (an airport referencing
// a country we never curated); an informational difference is an expected gap
// (a micro-state with no medium or large airport).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// KEY SETS
// ============================================================================

/// A named set of natural keys drawn from one artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySet {
    pub label: String,
    pub keys: BTreeSet<String>,
}

impl KeySet {
    pub fn new(label: &str, keys: BTreeSet<String>) -> Self {
        KeySet {
            label: label.to_string(),
            keys,
        }
    }

    pub fn from_iter<I, S>(label: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(label, keys.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ============================================================================
// DIFFERENCES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffSeverity {
    /// Data integrity violated, blocks release
    Blocking,

    /// Expected gap, listed for the operator
    Informational,
}

/// Keys present in one set and absent from the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDifference {
    /// What this difference means, e.g. "airport country codes missing from curated countries"
    pub description: String,
    pub severity: DiffSeverity,
    /// Sorted for stable reports
    pub keys: Vec<String>,
}

impl SetDifference {
    pub fn is_blocking(&self) -> bool {
        self.severity == DiffSeverity::Blocking && !self.keys.is_empty()
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub left_label: String,
    pub right_label: String,
    pub left_total: usize,
    pub right_total: usize,
    /// Keys in left but not right
    pub left_only: SetDifference,
    /// Keys in right but not left
    pub right_only: SetDifference,
    pub reconciled_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.left_only.keys.is_empty() && self.right_only.keys.is_empty()
    }

    pub fn has_blocking(&self) -> bool {
        self.left_only.is_blocking() || self.right_only.is_blocking()
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciled {} ({}) against {} ({}): {} only-left, {} only-right",
            self.left_label,
            self.left_total,
            self.right_label,
            self.right_total,
            self.left_only.keys.len(),
            self.right_only.keys.len(),
        )
    }
}

// ============================================================================
// RECONCILER
// ============================================================================

/// Configured comparison of two named key sets. Each validator instantiates
/// one of these with its own severity policy.
pub struct SetReconciler {
    /// How to classify keys found only in the left set
    pub left_only_severity: DiffSeverity,

    /// How to classify keys found only in the right set
    pub right_only_severity: DiffSeverity,

    /// Report text for the left-only difference
    pub left_only_description: String,

    /// Report text for the right-only difference
    pub right_only_description: String,
}

impl SetReconciler {
    pub fn new(
        left_only_severity: DiffSeverity,
        left_only_description: &str,
        right_only_severity: DiffSeverity,
        right_only_description: &str,
    ) -> Self {
        SetReconciler {
            left_only_severity,
            right_only_severity,
            left_only_description: left_only_description.to_string(),
            right_only_description: right_only_description.to_string(),
        }
    }

    /// Compute both one-sided differences between the key sets.
    pub fn reconcile(&self, left: &KeySet, right: &KeySet) -> ReconciliationReport {
        let left_only: Vec<String> = left.keys.difference(&right.keys).cloned().collect();
        let right_only: Vec<String> = right.keys.difference(&left.keys).cloned().collect();

        ReconciliationReport {
            left_label: left.label.clone(),
            right_label: right.label.clone(),
            left_total: left.len(),
            right_total: right.len(),
            left_only: SetDifference {
                description: self.left_only_description.clone(),
                severity: self.left_only_severity,
                keys: left_only,
            },
            right_only: SetDifference {
                description: self.right_only_description.clone(),
                severity: self.right_only_severity,
                keys: right_only,
            },
            reconciled_at: Utc::now(),
        }
    }
}
