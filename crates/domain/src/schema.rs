use std::collections::HashSet;

use terrasense_core::{AppError, AppResult};

use crate::dependency::{DependencyCondition, DependencyRule};
use crate::entity_type::EntityTypeId;
use crate::form::FieldSpec;
use crate::relationship::Dimension;
use crate::value::FormValues;

/// Field holding the active/inactive flag of a record form.
pub const STATUS_FIELD: &str = "statusFlag";

/// Form declaration of one entity type: fields, dependency chain and bulk dimensions.
#[derive(Debug, Clone)]
pub struct EntityFormSchema {
    entity_type: EntityTypeId,
    fields: Vec<FieldSpec>,
    chain: Vec<Vec<String>>,
    rules: Vec<DependencyRule>,
    referential_fields: Vec<String>,
    dimensions: Vec<Dimension>,
}

impl EntityFormSchema {
    /// Creates a schema with validated, uniquely named fields.
    pub fn new(entity_type: EntityTypeId, fields: Vec<FieldSpec>) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name()) {
                return Err(AppError::Validation(format!(
                    "duplicate field '{}' in form of '{}'",
                    field.name(),
                    entity_type.as_str()
                )));
            }
        }

        Ok(Self {
            entity_type,
            fields,
            chain: Vec::new(),
            rules: Vec::new(),
            referential_fields: Vec::new(),
            dimensions: Vec::new(),
        })
    }

    /// Declares the ordered dependency chain.
    ///
    /// Every field of step `i` is enabled only while all fields of steps `0..i`
    /// are filled.
    pub fn with_chain(mut self, steps: &[&[&str]]) -> AppResult<Self> {
        if !self.chain.is_empty() {
            return Err(AppError::Validation(format!(
                "dependency chain of '{}' is already declared",
                self.entity_type.as_str()
            )));
        }

        let mut seen = HashSet::new();
        let mut chain = Vec::with_capacity(steps.len());
        for step in steps {
            if step.is_empty() {
                return Err(AppError::Validation(format!(
                    "dependency chain of '{}' contains an empty step",
                    self.entity_type.as_str()
                )));
            }

            let mut names = Vec::with_capacity(step.len());
            for &field in *step {
                self.require_field(field)?;
                if !seen.insert(field.to_owned()) {
                    return Err(AppError::Validation(format!(
                        "field '{field}' appears twice in dependency chain of '{}'",
                        self.entity_type.as_str()
                    )));
                }
                names.push(field.to_owned());
            }
            chain.push(names);
        }

        for (position, step) in chain.iter().enumerate().skip(1) {
            let ancestors: Vec<String> = chain[..position].iter().flatten().cloned().collect();
            for field in step {
                self.rules.push(DependencyRule::new(
                    field.clone(),
                    DependencyCondition::all_filled(ancestors.iter().cloned()),
                )?);
            }
        }

        self.chain = chain;
        Ok(self)
    }

    /// Adds a dependency that is not part of the linear chain.
    pub fn with_rule(mut self, rule: DependencyRule) -> AppResult<Self> {
        self.require_field(rule.field())?;
        for referenced in rule.condition().referenced_fields() {
            self.require_field(referenced)?;
        }

        self.rules.push(rule);
        Ok(self)
    }

    /// Declares foreign keys inherited from the outer context and shown read-only.
    pub fn with_referential_fields(mut self, fields: &[&str]) -> AppResult<Self> {
        for field in fields {
            self.require_field(field)?;
        }

        self.referential_fields = fields.iter().map(|field| (*field).to_owned()).collect();
        Ok(self)
    }

    /// Declares the ordered dimensions of the bulk relationship editor.
    pub fn with_dimensions(mut self, dimensions: &[Dimension]) -> AppResult<Self> {
        let unique: HashSet<Dimension> = dimensions.iter().copied().collect();
        if unique.len() != dimensions.len() {
            return Err(AppError::Validation(format!(
                "duplicate dimension in relationship editor of '{}'",
                self.entity_type.as_str()
            )));
        }

        self.dimensions = dimensions.to_vec();
        Ok(self)
    }

    fn require_field(&self, name: &str) -> AppResult<()> {
        if self.field(name).is_none() {
            return Err(AppError::Validation(format!(
                "unknown field '{name}' in form of '{}'",
                self.entity_type.as_str()
            )));
        }

        Ok(())
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> EntityTypeId {
        self.entity_type
    }

    /// Returns the field declarations in display order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up one field declaration.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns the dependency chain steps.
    #[must_use]
    pub fn chain(&self) -> &[Vec<String>] {
        &self.chain
    }

    /// Returns the chain step holding `field`.
    #[must_use]
    pub fn chain_position(&self, field: &str) -> Option<usize> {
        self.chain
            .iter()
            .position(|step| step.iter().any(|name| name == field))
    }

    /// Returns the fields of every step after the one holding `field`.
    #[must_use]
    pub fn downstream_fields(&self, field: &str) -> Vec<&str> {
        let Some(position) = self.chain_position(field) else {
            return Vec::new();
        };

        self.chain[position + 1..]
            .iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Returns every dependency rule, chain-derived ones first.
    #[must_use]
    pub fn rules(&self) -> &[DependencyRule] {
        &self.rules
    }

    /// Returns the rules governing `field`.
    pub fn rules_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a DependencyRule> {
        self.rules.iter().filter(move |rule| rule.field() == field)
    }

    /// Returns the referential fields excluded from dirty detection.
    #[must_use]
    pub fn referential_fields(&self) -> &[String] {
        &self.referential_fields
    }

    /// Returns true when `field` is inherited from the outer context.
    #[must_use]
    pub fn is_referential(&self, field: &str) -> bool {
        self.referential_fields.iter().any(|name| name == field)
    }

    /// Returns the bulk editor dimensions; empty for single-record forms.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Returns true when the entity type is edited through a bulk relationship editor.
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// Returns the values of a freshly mounted form.
    #[must_use]
    pub fn default_values(&self) -> FormValues {
        self.fields
            .iter()
            .map(|field| (field.name().to_owned(), field.reset_value()))
            .collect()
    }
}
