use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use terrasense_core::{AppError, AppResult};

/// One axis of a bulk relationship edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Selected nodes.
    Node,
    /// Selected sensor types.
    Type,
    /// Selected metrics.
    Metric,
    /// Selected users.
    User,
    /// Selected profiles.
    Profile,
    /// Selected thresholds.
    Threshold,
}

impl Dimension {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Type => "type",
            Self::Metric => "metric",
            Self::User => "user",
            Self::Profile => "profile",
            Self::Threshold => "threshold",
        }
    }

    /// Returns the row field holding this dimension's identifier.
    #[must_use]
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Node => "nodeId",
            Self::Type => "typeId",
            Self::Metric => "metricId",
            Self::User => "userId",
            Self::Profile => "profileId",
            Self::Threshold => "thresholdId",
        }
    }

    /// Returns the label used in count summaries, pluralized for `count`.
    #[must_use]
    pub fn count_label(&self, count: usize) -> &'static str {
        match (self, count == 1) {
            (Self::Node, true) => "node",
            (Self::Node, false) => "nodes",
            (Self::Type, true) => "type",
            (Self::Type, false) => "types",
            (Self::Metric, true) => "metric",
            (Self::Metric, false) => "metrics",
            (Self::User, true) => "user",
            (Self::User, false) => "users",
            (Self::Profile, true) => "profile",
            (Self::Profile, false) => "profiles",
            (Self::Threshold, true) => "threshold",
            (Self::Threshold, false) => "thresholds",
        }
    }
}

/// Selected identifiers per dimension for one bulk screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipSet {
    selections: BTreeMap<Dimension, BTreeSet<i64>>,
}

impl RelationshipSet {
    /// Creates an empty relationship set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the selected identifiers for one dimension.
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&BTreeSet<i64>> {
        self.selections.get(&dimension)
    }

    /// Returns how many identifiers are selected for one dimension.
    #[must_use]
    pub fn count(&self, dimension: Dimension) -> usize {
        self.get(dimension).map_or(0, BTreeSet::len)
    }

    /// Returns true when no dimension holds a selection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.values().all(BTreeSet::is_empty)
    }

    /// Returns the listed dimensions that hold no selection.
    #[must_use]
    pub fn empty_dimensions(&self, dimensions: &[Dimension]) -> Vec<Dimension> {
        dimensions
            .iter()
            .copied()
            .filter(|dimension| self.count(*dimension) == 0)
            .collect()
    }

    /// Returns the size of the Cartesian product over `dimensions`.
    ///
    /// Zero when `dimensions` is empty or any of them has no selection.
    #[must_use]
    pub fn combination_count(&self, dimensions: &[Dimension]) -> usize {
        if dimensions.is_empty() {
            return 0;
        }

        dimensions
            .iter()
            .map(|dimension| self.count(*dimension))
            .fold(1_usize, usize::saturating_mul)
    }
}

/// Collects dimension selections as the user ticks checkboxes on a bulk screen.
#[derive(Debug, Clone, Default)]
pub struct RelationshipSetBuilder {
    selections: BTreeMap<Dimension, BTreeSet<i64>>,
}

impl RelationshipSetBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one identifier to a dimension; duplicates are ignored.
    pub fn select(&mut self, dimension: Dimension, id: i64) -> &mut Self {
        self.selections.entry(dimension).or_default().insert(id);
        self
    }

    /// Adds many identifiers to a dimension.
    pub fn select_many(
        &mut self,
        dimension: Dimension,
        ids: impl IntoIterator<Item = i64>,
    ) -> &mut Self {
        self.selections.entry(dimension).or_default().extend(ids);
        self
    }

    /// Removes one identifier from a dimension.
    pub fn deselect(&mut self, dimension: Dimension, id: i64) -> &mut Self {
        if let Some(selected) = self.selections.get_mut(&dimension) {
            selected.remove(&id);
        }
        self
    }

    /// Flips the selection state of one identifier.
    pub fn toggle(&mut self, dimension: Dimension, id: i64) -> &mut Self {
        let selected = self.selections.entry(dimension).or_default();
        if !selected.remove(&id) {
            selected.insert(id);
        }
        self
    }

    /// Drops every selection of one dimension.
    pub fn clear(&mut self, dimension: Dimension) -> &mut Self {
        self.selections.remove(&dimension);
        self
    }

    /// Returns the collected selections.
    #[must_use]
    pub fn build(&self) -> RelationshipSet {
        RelationshipSet {
            selections: self
                .selections
                .iter()
                .filter(|(_, ids)| !ids.is_empty())
                .map(|(dimension, ids)| (*dimension, ids.clone()))
                .collect(),
        }
    }
}

impl From<RelationshipSet> for RelationshipSetBuilder {
    fn from(value: RelationshipSet) -> Self {
        Self {
            selections: value.selections,
        }
    }
}

/// Natural composite key of a relationship row, one identifier per dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipKey(Vec<i64>);

impl RelationshipKey {
    /// Creates a key from identifiers ordered like the schema's dimensions.
    #[must_use]
    pub fn new(ids: Vec<i64>) -> Self {
        Self(ids)
    }

    /// Returns the identifiers.
    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.0
    }

    /// Returns the number of dimensions covered by the key.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl Display for RelationshipKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(formatter, "({})", ids.join(", "))
    }
}

/// Persisted status of a relationship row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RowStatus {
    /// Row is in effect.
    Active,
    /// Row is kept for history but not in effect.
    Inactive,
}

impl RowStatus {
    /// Status identifier of an active row.
    pub const ACTIVE_ID: i64 = 1;
    /// Canonical status identifier of an inactive row.
    pub const INACTIVE_ID: i64 = 0;
    /// Status identifier some sensor forms wrote for inactive rows.
    pub const LEGACY_INACTIVE_ID: i64 = 2;

    /// Parses a stored status identifier, accepting the legacy inactive value.
    pub fn from_status_id(status_id: i64) -> AppResult<Self> {
        match status_id {
            Self::ACTIVE_ID => Ok(Self::Active),
            Self::INACTIVE_ID | Self::LEGACY_INACTIVE_ID => Ok(Self::Inactive),
            _ => Err(AppError::Validation(format!(
                "unknown status id '{status_id}'"
            ))),
        }
    }

    /// Returns the identifier written back to the store.
    #[must_use]
    pub fn status_id(&self) -> i64 {
        match self {
            Self::Active => Self::ACTIVE_ID,
            Self::Inactive => Self::INACTIVE_ID,
        }
    }

    /// Returns true for active rows.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl TryFrom<i64> for RowStatus {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_status_id(value)
    }
}

impl From<RowStatus> for i64 {
    fn from(value: RowStatus) -> Self {
        value.status_id()
    }
}

/// Who changed a row and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// Acting user identifier.
    pub user_id: i64,
    /// Time of the change.
    pub at: DateTime<Utc>,
}

impl AuditStamp {
    /// Creates an audit stamp.
    #[must_use]
    pub fn new(user_id: i64, at: DateTime<Utc>) -> Self {
        Self { user_id, at }
    }
}

/// Audit columns carried by every relationship row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    /// Creating user.
    #[serde(default)]
    pub created_by: Option<i64>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modifying user.
    #[serde(default)]
    pub modified_by: Option<i64>,
    /// Last modification time.
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Relationship row keyed by its natural composite key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRow {
    key: RelationshipKey,
    #[serde(rename = "status_id")]
    status: RowStatus,
    #[serde(flatten)]
    audit: AuditFields,
}

impl RelationshipRow {
    /// Creates a row from stored parts.
    #[must_use]
    pub fn new(key: RelationshipKey, status: RowStatus, audit: AuditFields) -> Self {
        Self { key, status, audit }
    }

    /// Creates a brand-new active row stamped as created and modified by `stamp`.
    #[must_use]
    pub fn created(key: RelationshipKey, stamp: AuditStamp) -> Self {
        Self {
            key,
            status: RowStatus::Active,
            audit: AuditFields {
                created_by: Some(stamp.user_id),
                created_at: Some(stamp.at),
                modified_by: Some(stamp.user_id),
                modified_at: Some(stamp.at),
            },
        }
    }

    /// Returns the row with `status`, keeping creation audit and stamping modification.
    #[must_use]
    pub fn with_status(&self, status: RowStatus, stamp: AuditStamp) -> Self {
        Self {
            key: self.key.clone(),
            status,
            audit: AuditFields {
                modified_by: Some(stamp.user_id),
                modified_at: Some(stamp.at),
                ..self.audit
            },
        }
    }

    /// Returns the composite key.
    #[must_use]
    pub fn key(&self) -> &RelationshipKey {
        &self.key
    }

    /// Returns the row status.
    #[must_use]
    pub fn status(&self) -> RowStatus {
        self.status
    }

    /// Returns the audit columns.
    #[must_use]
    pub fn audit(&self) -> &AuditFields {
        &self.audit
    }

    /// Renders the row as the column map sent to the persistence layer.
    pub fn to_payload(&self, dimensions: &[Dimension]) -> AppResult<Value> {
        if dimensions.len() != self.key.arity() {
            return Err(AppError::Validation(format!(
                "row key {} does not match {} dimension(s)",
                self.key,
                dimensions.len()
            )));
        }

        let mut payload = Map::new();
        for (dimension, id) in dimensions.iter().zip(self.key.ids()) {
            payload.insert(dimension.key_field().to_owned(), Value::from(*id));
        }
        payload.insert("statusId".to_owned(), Value::from(self.status.status_id()));

        let audit_columns = [
            ("createdBy", self.audit.created_by.map(Value::from)),
            (
                "createdAt",
                self.audit.created_at.map(|at| Value::from(at.to_rfc3339())),
            ),
            ("modifiedBy", self.audit.modified_by.map(Value::from)),
            (
                "modifiedAt",
                self.audit.modified_at.map(|at| Value::from(at.to_rfc3339())),
            ),
        ];
        for (column, value) in audit_columns {
            if let Some(value) = value {
                payload.insert(column.to_owned(), value);
            }
        }

        Ok(Value::Object(payload))
    }
}

/// Existing rows as handed over by callers: either already flat or grouped
/// under an `original_rows` list per displayed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExistingRows {
    /// Rows grouped for display.
    Grouped(Vec<RowGroup>),
    /// One entry per stored row.
    Flat(Vec<RelationshipRow>),
}

/// Display grouping of stored rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowGroup {
    /// Rows folded into the displayed line.
    pub original_rows: Vec<RelationshipRow>,
}

impl ExistingRows {
    /// Flattens the input into one row per key, ordered by key.
    ///
    /// When a key appears more than once the active copy wins.
    #[must_use]
    pub fn normalize(self) -> Vec<RelationshipRow> {
        let rows = match self {
            Self::Flat(rows) => rows,
            Self::Grouped(groups) => groups
                .into_iter()
                .flat_map(|group| group.original_rows)
                .collect(),
        };

        let mut by_key: BTreeMap<RelationshipKey, RelationshipRow> = BTreeMap::new();
        for row in rows {
            match by_key.get(row.key()) {
                Some(existing) if existing.status().is_active() => {}
                _ => {
                    by_key.insert(row.key().clone(), row);
                }
            }
        }

        by_key.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    use super::{
        AuditFields, AuditStamp, Dimension, ExistingRows, RelationshipKey, RelationshipRow,
        RelationshipSetBuilder, RowGroup, RowStatus,
    };

    fn stamp() -> AuditStamp {
        let at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!());
        AuditStamp::new(7, at)
    }

    #[test]
    fn builder_keeps_sets_and_drops_empty_dimensions() {
        let mut builder = RelationshipSetBuilder::new();
        builder
            .select(Dimension::Node, 2)
            .select(Dimension::Node, 1)
            .select(Dimension::Node, 2)
            .toggle(Dimension::Type, 10)
            .toggle(Dimension::Metric, 5)
            .toggle(Dimension::Metric, 5);

        let set = builder.build();
        assert_eq!(set.count(Dimension::Node), 2);
        assert_eq!(set.count(Dimension::Type), 1);
        assert!(set.get(Dimension::Metric).is_none());
        assert_eq!(set.combination_count(&[Dimension::Node, Dimension::Type]), 2);
        assert_eq!(
            set.combination_count(&[Dimension::Node, Dimension::Type, Dimension::Metric]),
            0
        );
        assert_eq!(
            set.empty_dimensions(&[Dimension::Node, Dimension::Metric]),
            vec![Dimension::Metric]
        );
    }

    proptest! {
        #[test]
        fn builder_selections_behave_as_sets(
            nodes in proptest::collection::vec(0_i64..20, 0..30),
            types in proptest::collection::vec(0_i64..5, 0..10),
        ) {
            let mut builder = RelationshipSetBuilder::new();
            for node in &nodes {
                builder.select(Dimension::Node, *node);
            }
            builder.select_many(Dimension::Type, types.iter().copied());

            let set = builder.build();
            let distinct_nodes: BTreeSet<i64> = nodes.iter().copied().collect();
            let distinct_types: BTreeSet<i64> = types.iter().copied().collect();

            prop_assert_eq!(set.count(Dimension::Node), distinct_nodes.len());
            prop_assert_eq!(
                set.combination_count(&[Dimension::Node, Dimension::Type]),
                distinct_nodes.len() * distinct_types.len()
            );
        }
    }

    #[test]
    fn legacy_inactive_status_reads_as_inactive_and_writes_canonical() {
        let status = RowStatus::from_status_id(2).unwrap_or_else(|_| unreachable!());
        assert_eq!(status, RowStatus::Inactive);
        assert_eq!(status.status_id(), 0);
        assert!(RowStatus::from_status_id(9).is_err());
    }

    #[test]
    fn with_status_preserves_creation_audit() {
        let original = RelationshipRow::new(
            RelationshipKey::new(vec![1, 10]),
            RowStatus::Inactive,
            AuditFields {
                created_by: Some(3),
                ..AuditFields::default()
            },
        );

        let activated = original.with_status(RowStatus::Active, stamp());
        assert_eq!(activated.status(), RowStatus::Active);
        assert_eq!(activated.audit().created_by, Some(3));
        assert_eq!(activated.audit().modified_by, Some(7));
    }

    #[test]
    fn payload_maps_key_to_dimension_columns() {
        let row = RelationshipRow::created(RelationshipKey::new(vec![1, 10]), stamp());
        let payload = row
            .to_payload(&[Dimension::Node, Dimension::Type])
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(payload["nodeId"], json!(1));
        assert_eq!(payload["typeId"], json!(10));
        assert_eq!(payload["statusId"], json!(1));
        assert_eq!(payload["createdBy"], json!(7));
        assert!(row.to_payload(&[Dimension::Node]).is_err());
    }

    #[test]
    fn grouped_rows_flatten_with_active_copy_winning() {
        let inactive = RelationshipRow::new(
            RelationshipKey::new(vec![2, 10]),
            RowStatus::Inactive,
            AuditFields::default(),
        );
        let active = RelationshipRow::new(
            RelationshipKey::new(vec![2, 10]),
            RowStatus::Active,
            AuditFields::default(),
        );
        let other = RelationshipRow::new(
            RelationshipKey::new(vec![1, 10]),
            RowStatus::Active,
            AuditFields::default(),
        );

        let rows = ExistingRows::Grouped(vec![
            RowGroup {
                original_rows: vec![active.clone(), inactive],
            },
            RowGroup {
                original_rows: vec![other.clone()],
            },
        ])
        .normalize();

        assert_eq!(rows, vec![other, active]);
    }

    #[test]
    fn rows_deserialize_from_status_ids() {
        let rows: ExistingRows = serde_json::from_value(json!([
            { "key": [1, 10], "status_id": 1 },
            { "key": [2, 10], "status_id": 2, "created_by": 4 }
        ]))
        .unwrap_or_else(|_| unreachable!());

        let rows = rows.normalize();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].status(), RowStatus::Inactive);
        assert_eq!(rows[1].audit().created_by, Some(4));
    }
}
