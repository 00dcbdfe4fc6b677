use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use terrasense_core::AppError;

/// Kinds of records managed from the parameter console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityTypeId {
    /// Country (`pais`).
    Country,
    /// Company (`empresa`).
    Company,
    /// Farm (`fundo`).
    Farm,
    /// Location inside a farm (`ubicacion`).
    Location,
    /// Geo-point linking a node to a location (`localizacion`).
    GeoPoint,
    /// Entity grouping sensor types (`entidad`).
    Entity,
    /// Sensor type (`tipo`).
    Type,
    /// Node device (`nodo`).
    Node,
    /// Sensor, a node × type relationship (`sensor`).
    Sensor,
    /// Metric (`metrica`).
    Metric,
    /// Metric sensor, a node × type × metric relationship (`metricasensor`).
    MetricSensor,
    /// Threshold (`umbral`).
    Threshold,
    /// Threshold profile, a profile × threshold relationship (`perfilumbral`).
    ThresholdProfile,
    /// Criticality level (`criticidad`).
    Criticality,
    /// Contact medium (`medio`).
    Medium,
    /// Contact (`contacto`).
    Contact,
    /// Console user (`usuario`).
    User,
    /// Profile (`perfil`).
    Profile,
    /// User profile, a user × profile relationship (`usuarioperfil`).
    UserProfile,
}

impl EntityTypeId {
    /// Returns every managed entity type.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EntityTypeId] = &[
            EntityTypeId::Country,
            EntityTypeId::Company,
            EntityTypeId::Farm,
            EntityTypeId::Location,
            EntityTypeId::GeoPoint,
            EntityTypeId::Entity,
            EntityTypeId::Type,
            EntityTypeId::Node,
            EntityTypeId::Sensor,
            EntityTypeId::Metric,
            EntityTypeId::MetricSensor,
            EntityTypeId::Threshold,
            EntityTypeId::ThresholdProfile,
            EntityTypeId::Criticality,
            EntityTypeId::Medium,
            EntityTypeId::Contact,
            EntityTypeId::User,
            EntityTypeId::Profile,
            EntityTypeId::UserProfile,
        ];

        ALL
    }

    /// Returns the stable table name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "pais",
            Self::Company => "empresa",
            Self::Farm => "fundo",
            Self::Location => "ubicacion",
            Self::GeoPoint => "localizacion",
            Self::Entity => "entidad",
            Self::Type => "tipo",
            Self::Node => "nodo",
            Self::Sensor => "sensor",
            Self::Metric => "metrica",
            Self::MetricSensor => "metricasensor",
            Self::Threshold => "umbral",
            Self::ThresholdProfile => "perfilumbral",
            Self::Criticality => "criticidad",
            Self::Medium => "medio",
            Self::Contact => "contacto",
            Self::User => "usuario",
            Self::Profile => "perfil",
            Self::UserProfile => "usuarioperfil",
        }
    }

    /// Returns the English alias accepted alongside the table name.
    #[must_use]
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Company => "company",
            Self::Farm => "farm",
            Self::Location => "location",
            Self::GeoPoint => "geo_point",
            Self::Entity => "entity",
            Self::Type => "type",
            Self::Node => "node",
            Self::Sensor => "sensor",
            Self::Metric => "metric",
            Self::MetricSensor => "metric_sensor",
            Self::Threshold => "threshold",
            Self::ThresholdProfile => "threshold_profile",
            Self::Criticality => "criticality",
            Self::Medium => "medium",
            Self::Contact => "contact",
            Self::User => "user",
            Self::Profile => "profile",
            Self::UserProfile => "user_profile",
        }
    }

    /// Returns the column holding a record's own identifier.
    #[must_use]
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Country => "countryId",
            Self::Company => "companyId",
            Self::Farm => "farmId",
            Self::Location => "locationId",
            Self::GeoPoint => "geoPointId",
            Self::Entity => "entityId",
            Self::Type => "typeId",
            Self::Node => "nodeId",
            Self::Sensor => "sensorId",
            Self::Metric => "metricId",
            Self::MetricSensor => "metricSensorId",
            Self::Threshold => "thresholdId",
            Self::ThresholdProfile => "thresholdProfileId",
            Self::Criticality => "criticalityId",
            Self::Medium => "mediumId",
            Self::Contact => "contactId",
            Self::User => "userId",
            Self::Profile => "profileId",
            Self::UserProfile => "userProfileId",
        }
    }

    /// Returns the human-readable name shown in tabs and confirmation dialogs.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Country => "Country",
            Self::Company => "Company",
            Self::Farm => "Farm",
            Self::Location => "Location",
            Self::GeoPoint => "Geo Point",
            Self::Entity => "Entity",
            Self::Type => "Type",
            Self::Node => "Node",
            Self::Sensor => "Sensor",
            Self::Metric => "Metric",
            Self::MetricSensor => "Metric Sensor",
            Self::Threshold => "Threshold",
            Self::ThresholdProfile => "Threshold Profile",
            Self::Criticality => "Criticality",
            Self::Medium => "Medium",
            Self::Contact => "Contact",
            Self::User => "User",
            Self::Profile => "Profile",
            Self::UserProfile => "User Profile",
        }
    }
}

impl Display for EntityTypeId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EntityTypeId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|entity_type| {
                entity_type.as_str() == normalized || entity_type.alias() == normalized
            })
            .ok_or_else(|| AppError::Validation(format!("unknown entity type '{value}'")))
    }
}
