//! Detection of per-record relation loading (the N+1 pattern).
//!
//! Resolving a one-to-many, many-to-many or reverse one-to-one field issues
//! one statement per loaded record. Loading such a field across many records
//! is correct but costs one round-trip each; the tracker counts loads per
//! (model, field) pair and warns once a pair reaches the threshold.
//!
//! # Example
//!
//! ```ignore
//! // Triggers a warning with the default threshold of 3:
//! let users = env.pool("User")?.filter("active", Operator::Equals, true);
//! users.load(&["posts"])?;
//! ```

use std::collections::HashMap;

use serde::Serialize;

/// Counts relation loads per (model, field) pair.
#[derive(Debug)]
pub struct RelationLoadTracker {
    /// (model, field) -> load count
    counts: HashMap<(String, String), usize>,
    /// Threshold for warning (loads per relation field)
    threshold: usize,
    enabled: bool,
}

impl Default for RelationLoadTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about relation loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationLoadStats {
    /// Total number of relation loads recorded
    pub total_loads: usize,
    /// Number of distinct relation fields loaded
    pub relations_loaded: usize,
    /// Number of relation fields that reached the threshold
    pub potential_n1: usize,
}

impl RelationLoadTracker {
    /// Create a new tracker with default threshold (3).
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            threshold: 3,
            enabled: true,
        }
    }

    /// Set the threshold for warnings.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Disable tracking.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Record one per-record load of `field` on `model`.
    ///
    /// Warns exactly once per pair, when its count reaches the threshold.
    pub fn record_load(&mut self, model: &str, field: &str) {
        if !self.enabled {
            return;
        }

        let count = self
            .counts
            .entry((model.to_string(), field.to_string()))
            .or_insert(0);
        *count += 1;

        if *count == self.threshold {
            tracing::warn!(
                target: "recordset::n1",
                model = model,
                field = field,
                loads = *count,
                threshold = self.threshold,
                "N+1 relation loading detected; consider narrowing the collection before loading `{}`",
                field
            );
        }
    }

    /// Reset all counts.
    pub fn reset(&mut self) {
        self.counts.clear();
    }

    /// Get the current count for a specific relation field.
    #[must_use]
    pub fn count_for(&self, model: &str, field: &str) -> usize {
        self.counts
            .get(&(model.to_string(), field.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Get statistics about relation loading.
    #[must_use]
    pub fn stats(&self) -> RelationLoadStats {
        RelationLoadStats {
            total_loads: self.counts.values().sum(),
            relations_loaded: self.counts.len(),
            potential_n1: self
                .counts
                .values()
                .filter(|c| **c >= self.threshold)
                .count(),
        }
    }
}
