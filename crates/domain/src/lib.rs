//! Domain types and invariants of the parameter-editing engine.

#![forbid(unsafe_code)]

mod catalog;
mod dependency;
mod entity_type;
mod form;
mod navigation;
mod reconciliation;
mod relationship;
mod schema;
mod value;

pub use catalog::DependencyGraph;
pub use dependency::{DependencyCondition, DependencyRule};
pub use entity_type::EntityTypeId;
pub use form::{FieldKind, FieldSpec, FormMode};
pub use navigation::{NavigationKind, NavigationLabels};
pub use reconciliation::{DimensionCount, ReconciliationDiff, ReconciliationSummary};
pub use relationship::{
    AuditFields, AuditStamp, Dimension, ExistingRows, RelationshipKey, RelationshipRow,
    RelationshipSet, RelationshipSetBuilder, RowGroup, RowStatus,
};
pub use schema::{EntityFormSchema, STATUS_FIELD};
pub use value::{FormValues, changed_values, is_empty_value, is_field_filled, values_equivalent};
