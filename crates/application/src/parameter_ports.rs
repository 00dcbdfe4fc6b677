use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use terrasense_core::AppResult;
use terrasense_domain::{
    Dimension, EntityTypeId, FormMode, FormValues, ReconciliationDiff, RelationshipRow,
};

/// Outer filter a bulk screen is limited to, for example `entityId = 2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeKey(BTreeMap<String, i64>);

impl ScopeKey {
    /// Creates an unrestricted scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scope restricted by one more column.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, id: i64) -> Self {
        self.0.insert(field.into(), id);
        self
    }

    /// Returns the identifier required for one column.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<i64> {
        self.0.get(field).copied()
    }

    /// Returns true when nothing is restricted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for ScopeKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return formatter.write_str("*");
        }

        let entries: Vec<String> = self
            .0
            .iter()
            .map(|(field, id)| format!("{field}={id}"))
            .collect();
        formatter.write_str(&entries.join(","))
    }
}

/// Write request handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitPayload {
    /// Bulk relationship writes.
    Relationships {
        /// Scope the diff was computed in.
        scope: ScopeKey,
        /// Dimension order of every row key.
        dimensions: Vec<Dimension>,
        /// Rows to write.
        diff: ReconciliationDiff,
    },
    /// One record created or updated through a form.
    Record {
        /// Form mode the record comes from.
        mode: FormMode,
        /// Column values, audit columns included.
        values: FormValues,
    },
    /// Staged bulk edits.
    Batch {
        /// Column values per edited record.
        records: Vec<FormValues>,
    },
}

/// Answer of the persistence layer to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Whether the store accepted the write.
    pub success: bool,
    /// Rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmitOutcome {
    /// Creates an accepted outcome.
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Creates a rejected outcome.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Repository port for parameter tables.
#[async_trait]
pub trait ParameterRepository: Send + Sync {
    /// Lists the stored relationship rows of one entity type inside `scope`.
    async fn list_existing(
        &self,
        entity_type: EntityTypeId,
        scope: &ScopeKey,
    ) -> AppResult<Vec<RelationshipRow>>;

    /// Writes a submission.
    async fn submit(
        &self,
        entity_type: EntityTypeId,
        payload: SubmitPayload,
    ) -> AppResult<SubmitOutcome>;
}
