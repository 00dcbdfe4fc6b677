mod snapshot;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use terrasense_core::{AppError, AppResult, MissingRequired};
use terrasense_domain::{
    AuditStamp, Dimension, DimensionCount, EntityFormSchema, ReconciliationDiff,
    ReconciliationSummary, RelationshipKey, RelationshipRow, RelationshipSet, RowStatus,
};

pub use snapshot::SnapshotFingerprint;

/// Diff plus the counts shown before submitting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Rows to write.
    pub diff: ReconciliationDiff,
    /// Confirmation counts.
    pub summary: ReconciliationSummary,
}

/// Confirmation data for a bulk relationship submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPreview {
    /// Inactive rows that will be reactivated.
    pub to_activate: Vec<RelationshipRow>,
    /// Rows that will be inserted.
    pub to_create: Vec<RelationshipRow>,
    /// Active rows that will be deactivated.
    pub to_deactivate: Vec<RelationshipRow>,
    /// Number of rows that will be written.
    pub total_count: usize,
    /// Per-dimension and per-action counts.
    pub summary: ReconciliationSummary,
    /// Fingerprint of the rows the preview was computed from.
    pub fingerprint: SnapshotFingerprint,
}

impl ReconciliationPreview {
    /// Returns the diff the preview describes.
    #[must_use]
    pub fn diff(&self) -> ReconciliationDiff {
        ReconciliationDiff {
            to_activate: self.to_activate.clone(),
            to_create: self.to_create.clone(),
            to_deactivate: self.to_deactivate.clone(),
        }
    }
}

/// Turns a bulk selection into the minimal set of row writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinatorialReconciler;

impl CombinatorialReconciler {
    /// Creates a reconciler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns every key of the Cartesian product over `dimensions`, ordered by key.
    ///
    /// Dimensions of `selection` not listed are ignored; a listed dimension
    /// with no selection yields an empty product.
    #[must_use]
    pub fn cartesian_product(
        &self,
        selection: &RelationshipSet,
        dimensions: &[Dimension],
    ) -> Vec<RelationshipKey> {
        if dimensions.is_empty() {
            return Vec::new();
        }

        let mut keys: Vec<Vec<i64>> = vec![Vec::with_capacity(dimensions.len())];
        for dimension in dimensions {
            let Some(ids) = selection.get(*dimension) else {
                return Vec::new();
            };

            let mut next = Vec::with_capacity(keys.len().saturating_mul(ids.len()));
            for prefix in &keys {
                for id in ids {
                    let mut key = prefix.clone();
                    key.push(*id);
                    next.push(key);
                }
            }
            keys = next;
        }

        keys.into_iter().map(RelationshipKey::new).collect()
    }

    /// Computes the writes that make the stored rows match `selection`.
    ///
    /// `existing` must already be limited to the outer scope (for example the
    /// chosen entity). Duplicate keys collapse with the active copy winning.
    pub fn reconcile(
        &self,
        schema: &EntityFormSchema,
        selection: &RelationshipSet,
        existing: &[RelationshipRow],
        stamp: AuditStamp,
    ) -> AppResult<Reconciliation> {
        let dimensions = schema.dimensions();
        if dimensions.is_empty() {
            return Err(AppError::Validation(format!(
                "entity type '{}' has no relationship dimensions",
                schema.entity_type().as_str()
            )));
        }

        let empty = selection.empty_dimensions(dimensions);
        if !empty.is_empty() {
            return Err(AppError::MissingRequired(MissingRequired {
                fields: Vec::new(),
                dimensions: empty
                    .iter()
                    .map(|dimension| dimension.as_str().to_owned())
                    .collect(),
            }));
        }

        let existing = index_rows(existing, dimensions.len())?;
        let product = self.cartesian_product(selection, dimensions);
        let in_product: BTreeSet<&RelationshipKey> = product.iter().collect();

        let mut diff = ReconciliationDiff::default();
        for key in &product {
            match existing.get(key) {
                Some(row) if row.status().is_active() => {}
                Some(row) => diff.to_activate.push(row.with_status(RowStatus::Active, stamp)),
                None => diff.to_create.push(RelationshipRow::created(key.clone(), stamp)),
            }
        }
        for (key, row) in &existing {
            if row.status().is_active() && !in_product.contains(key) {
                diff.to_deactivate
                    .push(row.with_status(RowStatus::Inactive, stamp));
            }
        }

        let dimension_counts = dimensions
            .iter()
            .map(|dimension| DimensionCount {
                dimension: *dimension,
                count: selection.count(*dimension),
            })
            .collect();
        let summary = ReconciliationSummary::new(dimension_counts, &diff);

        Ok(Reconciliation { diff, summary })
    }

    /// Builds the confirmation preview, including the snapshot fingerprint.
    pub fn preview(
        &self,
        schema: &EntityFormSchema,
        selection: &RelationshipSet,
        existing: &[RelationshipRow],
        stamp: AuditStamp,
    ) -> AppResult<ReconciliationPreview> {
        let Reconciliation { diff, summary } = self.reconcile(schema, selection, existing, stamp)?;
        let fingerprint = SnapshotFingerprint::of(existing)?;

        Ok(ReconciliationPreview {
            total_count: diff.write_count(),
            to_activate: diff.to_activate,
            to_create: diff.to_create,
            to_deactivate: diff.to_deactivate,
            summary,
            fingerprint,
        })
    }
}

fn index_rows(
    rows: &[RelationshipRow],
    arity: usize,
) -> AppResult<BTreeMap<RelationshipKey, RelationshipRow>> {
    let mut by_key: BTreeMap<RelationshipKey, RelationshipRow> = BTreeMap::new();
    for row in rows {
        if row.key().arity() != arity {
            return Err(AppError::Validation(format!(
                "existing row {} does not match {arity} dimension(s)",
                row.key()
            )));
        }

        match by_key.get(row.key()) {
            Some(kept) if kept.status().is_active() => {}
            _ => {
                by_key.insert(row.key().clone(), row.clone());
            }
        }
    }

    Ok(by_key)
}

#[cfg(test)]
mod tests;
