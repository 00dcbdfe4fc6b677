use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use terrasense_domain::{
    DependencyGraph, EntityTypeId, FormMode, FormValues, RelationshipSet, STATUS_FIELD,
    is_empty_value, values_equivalent,
};

/// Snapshot of a form session taken when the user tries to leave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirtyCheck {
    /// Edited entity type.
    pub entity_type: EntityTypeId,
    /// Editing mode.
    pub mode: FormMode,
    /// Current values; for update forms only the fields that differ from the fetched row.
    pub values: FormValues,
    /// Current bulk selections.
    #[serde(default)]
    pub relationships: RelationshipSet,
    /// Staged bulk edits.
    #[serde(default)]
    pub staged_edits: Vec<FormValues>,
}

impl DirtyCheck {
    /// Creates a check with no selections and nothing staged.
    #[must_use]
    pub fn new(entity_type: EntityTypeId, mode: FormMode, values: FormValues) -> Self {
        Self {
            entity_type,
            mode,
            values,
            relationships: RelationshipSet::new(),
            staged_edits: Vec::new(),
        }
    }
}

/// Decides whether leaving a form would lose user edits.
#[derive(Debug, Clone)]
pub struct UnsavedChangesDetector {
    graph: Arc<DependencyGraph>,
}

impl UnsavedChangesDetector {
    /// Creates a detector over a form catalog.
    #[must_use]
    pub fn new(graph: Arc<DependencyGraph>) -> Self {
        Self { graph }
    }

    /// Returns true when the captured state holds edits worth confirming.
    #[must_use]
    pub fn is_dirty(&self, check: &DirtyCheck) -> bool {
        let schema = self.graph.schema(check.entity_type);

        match check.mode {
            FormMode::Massive => !check.staged_edits.is_empty(),
            FormMode::Update => check.values.values().any(holds_value),
            FormMode::Insert | FormMode::Multiple => match schema {
                Some(schema) if schema.is_relationship() => {
                    check.relationships.combination_count(schema.dimensions()) > 0
                }
                Some(schema) => check.values.iter().any(|(field, value)| {
                    if schema.is_referential(field) {
                        return false;
                    }
                    if field == STATUS_FIELD {
                        return schema
                            .field(field)
                            .is_some_and(|spec| !values_equivalent(value, &spec.reset_value()));
                    }
                    !is_empty_value(value)
                }),
                None => any_filled(&check.values),
            },
        }
    }
}

fn any_filled(values: &FormValues) -> bool {
    values.values().any(|value| !is_empty_value(value))
}

/// Update edits count unless null or blank; `false` and `0` are real edits.
fn holds_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    }
}
