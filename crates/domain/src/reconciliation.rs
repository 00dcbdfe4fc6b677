use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::relationship::{Dimension, RelationshipKey, RelationshipRow};

/// Rows to write so the store matches a bulk selection.
///
/// The three lists are disjoint by key and ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationDiff {
    /// Existing inactive rows switched back to active.
    pub to_activate: Vec<RelationshipRow>,
    /// Rows that do not exist yet.
    pub to_create: Vec<RelationshipRow>,
    /// Existing active rows outside the selection, switched to inactive.
    pub to_deactivate: Vec<RelationshipRow>,
}

impl ReconciliationDiff {
    /// Returns true when nothing needs to be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_activate.is_empty() && self.to_create.is_empty() && self.to_deactivate.is_empty()
    }

    /// Returns the number of rows to write.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.to_activate.len() + self.to_create.len() + self.to_deactivate.len()
    }

    /// Returns every row of the diff, activations first.
    pub fn rows(&self) -> impl Iterator<Item = &RelationshipRow> {
        self.to_activate
            .iter()
            .chain(self.to_create.iter())
            .chain(self.to_deactivate.iter())
    }

    /// Applies the diff to a snapshot and returns the resulting rows ordered by key.
    #[must_use]
    pub fn apply_to(&self, snapshot: &[RelationshipRow]) -> Vec<RelationshipRow> {
        let mut by_key: BTreeMap<RelationshipKey, RelationshipRow> = snapshot
            .iter()
            .map(|row| (row.key().clone(), row.clone()))
            .collect();

        for row in self.rows() {
            by_key.insert(row.key().clone(), row.clone());
        }

        by_key.into_values().collect()
    }
}

/// Selection size of one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionCount {
    /// Dimension.
    pub dimension: Dimension,
    /// Selected identifiers.
    pub count: usize,
}

/// Counts shown in the confirmation dialog before a bulk submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Selection size per dimension, in dimension order.
    pub dimension_counts: Vec<DimensionCount>,
    /// Size of the Cartesian product.
    pub total_combinations: usize,
    /// Rows to reactivate.
    pub activate_count: usize,
    /// Rows to create.
    pub create_count: usize,
    /// Rows to deactivate.
    pub deactivate_count: usize,
    /// Combinations already active.
    pub unchanged_count: usize,
}

impl ReconciliationSummary {
    /// Builds the summary of a diff computed over `dimension_counts`.
    #[must_use]
    pub fn new(dimension_counts: Vec<DimensionCount>, diff: &ReconciliationDiff) -> Self {
        let total_combinations = if dimension_counts.is_empty() {
            0
        } else {
            dimension_counts
                .iter()
                .map(|entry| entry.count)
                .fold(1_usize, usize::saturating_mul)
        };
        let activate_count = diff.to_activate.len();
        let create_count = diff.to_create.len();

        Self {
            dimension_counts,
            total_combinations,
            activate_count,
            create_count,
            deactivate_count: diff.to_deactivate.len(),
            unchanged_count: total_combinations.saturating_sub(activate_count + create_count),
        }
    }

    /// Returns the selection size of the node dimension, zero when absent.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.dimension_counts
            .iter()
            .find(|entry| entry.dimension == Dimension::Node)
            .map_or(0, |entry| entry.count)
    }
}

impl Display for ReconciliationSummary {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let factors: Vec<String> = self
            .dimension_counts
            .iter()
            .map(|entry| {
                format!(
                    "{} {}",
                    entry.count,
                    entry.dimension.count_label(entry.count)
                )
            })
            .collect();

        write!(
            formatter,
            "{} = {} combination{} ({} to activate, {} to create, {} to deactivate, {} unchanged)",
            factors.join(" × "),
            self.total_combinations,
            if self.total_combinations == 1 { "" } else { "s" },
            self.activate_count,
            self.create_count,
            self.deactivate_count,
            self.unchanged_count
        )
    }
}
