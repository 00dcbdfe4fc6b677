use std::collections::BTreeSet;

use serde_json::Value;
use terrasense_core::{AppError, AppResult, SessionId};
use terrasense_domain::{
    EntityFormSchema, EntityTypeId, FormMode, FormValues, RelationshipSet, RelationshipSetBuilder,
    changed_values, values_equivalent,
};
use tracing::debug;

use crate::unsaved_changes::DirtyCheck;

/// Editing state of the parameter screen currently mounted.
#[derive(Debug, Clone)]
pub struct FormSession {
    id: SessionId,
    schema: EntityFormSchema,
    mode: FormMode,
    context: FormValues,
    baseline: Option<FormValues>,
    values: FormValues,
    selections: RelationshipSetBuilder,
    staged_edits: Vec<FormValues>,
}

impl FormSession {
    /// Mounts a create form. Context entries for declared fields (parent keys
    /// chosen in outer filters) are copied over the defaults.
    #[must_use]
    pub fn insert(schema: &EntityFormSchema, context: FormValues) -> Self {
        Self::mount(schema, FormMode::Insert, context, None)
    }

    /// Mounts an edit form over a fetched record.
    #[must_use]
    pub fn update(schema: &EntityFormSchema, snapshot: FormValues) -> Self {
        Self::mount(schema, FormMode::Update, FormValues::new(), Some(snapshot))
    }

    /// Mounts a bulk-edit form with an empty staging list.
    #[must_use]
    pub fn massive(schema: &EntityFormSchema) -> Self {
        Self::mount(schema, FormMode::Massive, FormValues::new(), None)
    }

    /// Mounts a bulk relationship editor.
    #[must_use]
    pub fn multiple(schema: &EntityFormSchema, context: FormValues) -> Self {
        Self::mount(schema, FormMode::Multiple, context, None)
    }

    fn mount(
        schema: &EntityFormSchema,
        mode: FormMode,
        context: FormValues,
        baseline: Option<FormValues>,
    ) -> Self {
        let context: FormValues = context
            .into_iter()
            .filter(|(field, _)| schema.field(field).is_some())
            .collect();
        let baseline = baseline.map(|snapshot| {
            let mut values = schema.default_values();
            values.extend(snapshot);
            values
        });
        let values = initial_values(schema, &context, baseline.as_ref());

        Self {
            id: SessionId::new(),
            schema: schema.clone(),
            mode,
            context,
            baseline,
            values,
            selections: RelationshipSetBuilder::new(),
            staged_edits: Vec::new(),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the edited entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityTypeId {
        self.schema.entity_type()
    }

    /// Returns the form schema.
    #[must_use]
    pub fn schema(&self) -> &EntityFormSchema {
        &self.schema
    }

    /// Returns the editing mode.
    #[must_use]
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Returns the current field values.
    #[must_use]
    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Returns the fetched record an update form started from.
    #[must_use]
    pub fn baseline(&self) -> Option<&FormValues> {
        self.baseline.as_ref()
    }

    /// Returns one field value.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Sets one field and clears everything that depended on its old value.
    ///
    /// Returns the fields that were reset.
    pub fn set_value(&mut self, field: &str, value: Value) -> AppResult<Vec<String>> {
        if self.schema.field(field).is_none() {
            return Err(AppError::Validation(format!(
                "unknown field '{field}' in form of '{}'",
                self.entity_type().as_str()
            )));
        }

        let changed = self
            .values
            .get(field)
            .is_none_or(|previous| !values_equivalent(previous, &value));
        self.values.insert(field.to_owned(), value);

        if !changed {
            return Ok(Vec::new());
        }

        let mut reset = BTreeSet::new();
        let downstream: Vec<String> = self
            .schema
            .downstream_fields(field)
            .into_iter()
            .map(str::to_owned)
            .collect();
        for name in downstream {
            if self.reset_field(&name) {
                reset.insert(name);
            }
        }
        reset.extend(self.reset_disabled_fields());

        let reset: Vec<String> = reset.into_iter().collect();
        if !reset.is_empty() {
            debug!(
                session_id = %self.id,
                entity_type = %self.entity_type(),
                field,
                reset = ?reset,
                "cascaded field reset"
            );
        }

        Ok(reset)
    }

    /// Clears one field back to its default, cascading like [`Self::set_value`].
    pub fn clear_field(&mut self, field: &str) -> AppResult<Vec<String>> {
        let reset_value = self
            .schema
            .field(field)
            .map(|spec| spec.reset_value())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown field '{field}' in form of '{}'",
                    self.entity_type().as_str()
                ))
            })?;

        self.set_value(field, reset_value)
    }

    fn reset_field(&mut self, field: &str) -> bool {
        let Some(reset_value) = self.schema.field(field).map(|spec| spec.reset_value()) else {
            return false;
        };

        let already_reset = self
            .values
            .get(field)
            .is_some_and(|current| current == &reset_value);
        self.values.insert(field.to_owned(), reset_value);
        !already_reset
    }

    fn reset_disabled_fields(&mut self) -> Vec<String> {
        let mut reset = Vec::new();

        // Resetting one field can disable another; bounded by the field count.
        for _ in 0..self.schema.fields().len() {
            let disabled: Vec<String> = self
                .schema
                .fields()
                .iter()
                .map(|spec| spec.name())
                .filter(|name| {
                    !self
                        .schema
                        .rules_for(name)
                        .all(|rule| rule.allows(&self.values))
                })
                .map(str::to_owned)
                .collect();

            let mut changed = false;
            for name in disabled {
                if self.reset_field(&name) {
                    changed = true;
                    reset.push(name);
                }
            }

            if !changed {
                break;
            }
        }

        reset
    }

    /// Discards every edit and returns to the state right after mounting.
    pub fn reset(&mut self) {
        self.values = initial_values(&self.schema, &self.context, self.baseline.as_ref());
        self.selections = RelationshipSetBuilder::new();
        self.staged_edits.clear();
        debug!(session_id = %self.id, entity_type = %self.entity_type(), "form session reset");
    }

    /// Returns the dimension selections of a bulk relationship editor.
    #[must_use]
    pub fn selections(&self) -> &RelationshipSetBuilder {
        &self.selections
    }

    /// Returns mutable dimension selections.
    pub fn selections_mut(&mut self) -> &mut RelationshipSetBuilder {
        &mut self.selections
    }

    /// Returns the collected relationship set.
    #[must_use]
    pub fn relationship_set(&self) -> RelationshipSet {
        self.selections.build()
    }

    /// Stages the current values as one bulk edit and clears the form for the next.
    pub fn stage_current(&mut self) {
        let staged = std::mem::replace(
            &mut self.values,
            initial_values(&self.schema, &self.context, self.baseline.as_ref()),
        );
        self.staged_edits.push(staged);
    }

    /// Adds one prepared edit to the staging list. Besides declared fields an
    /// edit may only carry the record's key column.
    pub fn stage_edit(&mut self, values: FormValues) -> AppResult<()> {
        let key_field = self.entity_type().key_field();
        let unknown: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|field| *field != key_field && self.schema.field(field).is_none())
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::Validation(format!(
                "unknown fields [{}] in staged edit of '{}'",
                unknown.join(", "),
                self.entity_type().as_str()
            )));
        }

        self.staged_edits.push(values);
        Ok(())
    }

    /// Returns the staged bulk edits.
    #[must_use]
    pub fn staged_edits(&self) -> &[FormValues] {
        &self.staged_edits
    }

    /// Returns what the user changed: the changed fields of an update form,
    /// every value otherwise.
    #[must_use]
    pub fn edits(&self) -> FormValues {
        match (&self.mode, &self.baseline) {
            (FormMode::Update, Some(baseline)) => changed_values(baseline, &self.values),
            _ => self.values.clone(),
        }
    }

    /// Captures the state the unsaved-changes check needs.
    ///
    /// Values still equal to the mounted context were not typed by the user and
    /// are left out.
    #[must_use]
    pub fn dirty_check(&self) -> DirtyCheck {
        let values = self
            .edits()
            .into_iter()
            .filter(|(field, value)| {
                self.context
                    .get(field)
                    .is_none_or(|mounted| !values_equivalent(mounted, value))
            })
            .collect();

        DirtyCheck {
            entity_type: self.entity_type(),
            mode: self.mode,
            values,
            relationships: self.relationship_set(),
            staged_edits: self.staged_edits.clone(),
        }
    }
}

fn initial_values(
    schema: &EntityFormSchema,
    context: &FormValues,
    baseline: Option<&FormValues>,
) -> FormValues {
    if let Some(baseline) = baseline {
        return baseline.clone();
    }

    let mut values = schema.default_values();
    values.extend(context.iter().map(|(field, value)| (field.clone(), value.clone())));
    values
}

#[cfg(test)]
mod tests;
