//! Declarative form catalog of every managed entity type.

use std::collections::BTreeMap;

use serde_json::Value;
use terrasense_core::{AppError, AppResult};

use crate::dependency::{DependencyCondition, DependencyRule};
use crate::entity_type::EntityTypeId;
use crate::form::{FieldKind, FieldSpec};
use crate::relationship::Dimension;
use crate::schema::{EntityFormSchema, STATUS_FIELD};

/// Form schemas keyed by entity type.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    schemas: BTreeMap<EntityTypeId, EntityFormSchema>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema, replacing any previous schema of the same entity type.
    pub fn insert(&mut self, schema: EntityFormSchema) {
        self.schemas.insert(schema.entity_type(), schema);
    }

    /// Returns the schema of one entity type.
    #[must_use]
    pub fn schema(&self, entity_type: EntityTypeId) -> Option<&EntityFormSchema> {
        self.schemas.get(&entity_type)
    }

    /// Returns the schema of one entity type or a validation error.
    pub fn require_schema(&self, entity_type: EntityTypeId) -> AppResult<&EntityFormSchema> {
        self.schema(entity_type).ok_or_else(|| {
            AppError::Validation(format!(
                "no form declared for entity type '{}'",
                entity_type.as_str()
            ))
        })
    }

    /// Returns every registered schema.
    pub fn schemas(&self) -> impl Iterator<Item = &EntityFormSchema> {
        self.schemas.values()
    }

    /// Builds the console's catalog of entity forms.
    pub fn standard() -> AppResult<Self> {
        let mut graph = Self::new();

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Country,
                vec![
                    text("country", true)?,
                    text("countryAbbrev", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["country"], &["countryAbbrev"]])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Company,
                vec![
                    foreign_key("countryId", true)?,
                    text("company", true)?,
                    text("companyAbbrev", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["countryId"], &["company"], &["companyAbbrev"]])?
            .with_referential_fields(&["countryId"])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Farm,
                vec![
                    foreign_key("countryId", false)?,
                    foreign_key("companyId", true)?,
                    text("farm", true)?,
                    text("farmAbbrev", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["companyId"], &["farm"], &["farmAbbrev"]])?
            .with_referential_fields(&["countryId", "companyId"])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Location,
                vec![
                    foreign_key("companyId", false)?,
                    foreign_key("farmId", true)?,
                    text("location", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["farmId"], &["location"]])?
            .with_referential_fields(&["companyId", "farmId"])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::GeoPoint,
                vec![
                    foreign_key("locationId", true)?,
                    foreign_key("nodeId", true)?,
                    number("latitude", true)?,
                    number("longitude", true)?,
                    text("reference", false)?,
                    status()?,
                ],
            )?
            .with_chain(&[
                &["locationId"],
                &["nodeId"],
                &["latitude", "longitude"],
                &["reference"],
            ])?,
        );

        graph.insert(
            EntityFormSchema::new(EntityTypeId::Entity, vec![text("entity", true)?, status()?])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Type,
                vec![
                    foreign_key("entityId", true)?,
                    text("type", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["entityId"], &["type"]])?
            .with_referential_fields(&["entityId"])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Node,
                vec![
                    text("node", true)?,
                    text("devEui", true)?,
                    text("appEui", true)?,
                    text("appKey", true)?,
                    text("atPin", false)?,
                    status()?,
                ],
            )?
            .with_chain(&[
                &["node"],
                &["devEui"],
                &["appEui", "appKey", "atPin", STATUS_FIELD],
            ])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Sensor,
                vec![
                    foreign_key("entityId", false)?,
                    foreign_key("nodeId", true)?,
                    foreign_key("typeId", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["nodeId"], &["typeId"]])?
            .with_referential_fields(&["entityId"])?
            .with_dimensions(&[Dimension::Node, Dimension::Type])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Metric,
                vec![text("metric", true)?, text("unit", true)?, status()?],
            )?
            .with_chain(&[&["metric"], &["unit"]])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::MetricSensor,
                vec![
                    foreign_key("entityId", false)?,
                    foreign_key("nodeId", true)?,
                    foreign_key("typeId", true)?,
                    foreign_key("metricId", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["nodeId"], &["typeId"], &["metricId"]])?
            .with_referential_fields(&["entityId"])?
            .with_dimensions(&[Dimension::Node, Dimension::Type, Dimension::Metric])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Threshold,
                vec![
                    text("name", true)?,
                    foreign_key("locationId", true)?,
                    foreign_key("criticalityId", true)?,
                    foreign_key("nodeId", true)?,
                    foreign_key("metricId", true)?,
                    foreign_key("typeId", true)?,
                    number("minimum", true)?,
                    number("maximum", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[
                &["name"],
                &["locationId"],
                &["criticalityId"],
                &["nodeId"],
                &["metricId"],
                &["typeId"],
            ])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::ThresholdProfile,
                vec![
                    foreign_key("profileId", true)?,
                    foreign_key("thresholdId", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["profileId"], &["thresholdId"]])?
            .with_dimensions(&[Dimension::Profile, Dimension::Threshold])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Criticality,
                vec![
                    text("criticality", true)?,
                    number("frequency", true)?,
                    number("escalation", false)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["criticality"], &["frequency"]])?
            .with_rule(DependencyRule::new(
                "escalation",
                DependencyCondition::all_filled(["criticality", "frequency"]),
            )?)?,
        );

        graph.insert(
            EntityFormSchema::new(EntityTypeId::Medium, vec![text("medium", true)?, status()?])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Contact,
                vec![
                    foreign_key("userId", true)?,
                    foreign_key("mediumId", true)?,
                    text("contact", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["userId"], &["mediumId"], &["contact"]])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::User,
                vec![
                    text("login", true)?,
                    text("firstName", true)?,
                    text("lastName", true)?,
                    text("email", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["login"], &["firstName", "lastName"], &["email"]])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::Profile,
                vec![text("profile", true)?, number("level", true)?, status()?],
            )?
            .with_chain(&[&["profile"], &["level"]])?,
        );

        graph.insert(
            EntityFormSchema::new(
                EntityTypeId::UserProfile,
                vec![
                    foreign_key("userId", true)?,
                    foreign_key("profileId", true)?,
                    status()?,
                ],
            )?
            .with_chain(&[&["userId"], &["profileId"]])?
            .with_dimensions(&[Dimension::User, Dimension::Profile])?,
        );

        Ok(graph)
    }
}

fn text(name: &str, required: bool) -> AppResult<FieldSpec> {
    FieldSpec::new(name, FieldKind::Text, required, None)
}

fn number(name: &str, required: bool) -> AppResult<FieldSpec> {
    FieldSpec::new(name, FieldKind::Number, required, None)
}

fn foreign_key(name: &str, required: bool) -> AppResult<FieldSpec> {
    FieldSpec::new(name, FieldKind::ForeignKey, required, None)
}

fn status() -> AppResult<FieldSpec> {
    FieldSpec::new(STATUS_FIELD, FieldKind::Boolean, false, Some(Value::Bool(true)))
}
