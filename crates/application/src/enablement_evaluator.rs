use std::sync::Arc;

use serde::{Deserialize, Serialize};
use terrasense_core::{AppError, AppResult, MissingRequired};
use terrasense_domain::{DependencyGraph, EntityTypeId, FormValues, is_field_filled};

/// Widget state of one field for the current values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProps {
    /// Field cannot be edited yet.
    pub disabled: bool,
    /// Field must be filled before submit.
    pub required: bool,
}

/// Decides which fields of a form are editable and required.
#[derive(Debug, Clone)]
pub struct EnablementEvaluator {
    graph: Arc<DependencyGraph>,
}

impl EnablementEvaluator {
    /// Creates an evaluator over a form catalog.
    #[must_use]
    pub fn new(graph: Arc<DependencyGraph>) -> Self {
        Self { graph }
    }

    /// Returns the form catalog.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Returns whether `field` is editable for `values`.
    ///
    /// Fields without rules, unknown fields and unknown entity types are enabled.
    #[must_use]
    pub fn is_enabled(&self, entity_type: EntityTypeId, field: &str, values: &FormValues) -> bool {
        let Some(schema) = self.graph.schema(entity_type) else {
            return true;
        };

        schema.rules_for(field).all(|rule| rule.allows(values))
    }

    /// Returns the disabled/required flags of one field.
    #[must_use]
    pub fn field_props(
        &self,
        entity_type: EntityTypeId,
        field: &str,
        values: &FormValues,
    ) -> FieldProps {
        let enabled = self.is_enabled(entity_type, field, values);
        let required_when_enabled = self
            .graph
            .schema(entity_type)
            .and_then(|schema| schema.field(field))
            .is_some_and(|spec| spec.required_when_enabled());

        FieldProps {
            disabled: !enabled,
            required: enabled && required_when_enabled,
        }
    }

    /// Returns the fields that are required whenever they are enabled.
    #[must_use]
    pub fn required_fields(&self, entity_type: EntityTypeId) -> Vec<String> {
        self.graph
            .schema(entity_type)
            .map(|schema| {
                schema
                    .fields()
                    .iter()
                    .filter(|field| field.required_when_enabled())
                    .map(|field| field.name().to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the declared fields that are currently enabled, in display order.
    #[must_use]
    pub fn enabled_fields(&self, entity_type: EntityTypeId, values: &FormValues) -> Vec<String> {
        self.graph
            .schema(entity_type)
            .map(|schema| {
                schema
                    .fields()
                    .iter()
                    .filter(|field| self.is_enabled(entity_type, field.name(), values))
                    .map(|field| field.name().to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns enabled required fields that hold empty values.
    #[must_use]
    pub fn missing_required_fields(
        &self,
        entity_type: EntityTypeId,
        values: &FormValues,
    ) -> Vec<String> {
        self.graph
            .schema(entity_type)
            .map(|schema| {
                schema
                    .fields()
                    .iter()
                    .filter(|field| {
                        field.required_when_enabled()
                            && self.is_enabled(entity_type, field.name(), values)
                            && !is_field_filled(values, field.name())
                    })
                    .map(|field| field.name().to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fails with the list of empty required fields, if any.
    pub fn validate_required(&self, entity_type: EntityTypeId, values: &FormValues) -> AppResult<()> {
        let fields = self.missing_required_fields(entity_type, values);
        if fields.is_empty() {
            return Ok(());
        }

        Err(AppError::MissingRequired(MissingRequired {
            fields,
            dimensions: Vec::new(),
        }))
    }
}
