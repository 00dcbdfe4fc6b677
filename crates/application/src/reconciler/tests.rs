use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use terrasense_core::AppError;
use terrasense_domain::{
    AuditFields, AuditStamp, DependencyGraph, Dimension, EntityFormSchema, EntityTypeId,
    RelationshipKey, RelationshipRow, RelationshipSet, RelationshipSetBuilder, RowStatus,
};

use super::CombinatorialReconciler;

fn schema(entity_type: EntityTypeId) -> EntityFormSchema {
    DependencyGraph::standard()
        .and_then(|graph| graph.require_schema(entity_type).cloned())
        .unwrap_or_else(|_| unreachable!())
}

fn stamp() -> AuditStamp {
    let at = Utc
        .with_ymd_and_hms(2024, 6, 3, 9, 30, 0)
        .single()
        .unwrap_or_else(|| unreachable!());
    AuditStamp::new(42, at)
}

fn creation_audit() -> AuditFields {
    let at = Utc
        .with_ymd_and_hms(2023, 1, 15, 8, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!());
    AuditFields {
        created_by: Some(3),
        created_at: Some(at),
        modified_by: Some(3),
        modified_at: Some(at),
    }
}

fn row(ids: &[i64], status: RowStatus) -> RelationshipRow {
    RelationshipRow::new(RelationshipKey::new(ids.to_vec()), status, creation_audit())
}

fn selection(nodes: &[i64], types: &[i64]) -> RelationshipSet {
    let mut builder = RelationshipSetBuilder::new();
    builder
        .select_many(Dimension::Node, nodes.iter().copied())
        .select_many(Dimension::Type, types.iter().copied());
    builder.build()
}

fn keys(rows: &[RelationshipRow]) -> Vec<Vec<i64>> {
    rows.iter().map(|row| row.key().ids().to_vec()).collect()
}

#[test]
fn reactivates_inactive_rows_inside_the_selection() {
    let existing = vec![row(&[1, 10], RowStatus::Active), row(&[2, 10], RowStatus::Inactive)];

    let reconciliation = CombinatorialReconciler::new()
        .reconcile(
            &schema(EntityTypeId::Sensor),
            &selection(&[1, 2], &[10]),
            &existing,
            stamp(),
        )
        .unwrap_or_else(|_| unreachable!());

    let diff = reconciliation.diff;
    assert_eq!(keys(&diff.to_activate), vec![vec![2, 10]]);
    assert!(diff.to_create.is_empty());
    assert!(diff.to_deactivate.is_empty());

    let activated = &diff.to_activate[0];
    assert_eq!(activated.status(), RowStatus::Active);
    assert_eq!(activated.audit().created_by, Some(3));
    assert_eq!(activated.audit().modified_by, Some(42));
    assert_eq!(activated.audit().modified_at, Some(stamp().at));
    assert_eq!(reconciliation.summary.unchanged_count, 1);
}

#[test]
fn deactivates_active_rows_outside_the_selection() {
    let existing = vec![
        row(&[1, 10], RowStatus::Active),
        row(&[2, 10], RowStatus::Inactive),
        row(&[3, 10], RowStatus::Active),
        row(&[4, 10], RowStatus::Inactive),
    ];

    let diff = CombinatorialReconciler::new()
        .reconcile(
            &schema(EntityTypeId::Sensor),
            &selection(&[1, 2], &[10]),
            &existing,
            stamp(),
        )
        .unwrap_or_else(|_| unreachable!())
        .diff;

    assert_eq!(keys(&diff.to_activate), vec![vec![2, 10]]);
    assert_eq!(keys(&diff.to_deactivate), vec![vec![3, 10]]);
    assert_eq!(diff.to_deactivate[0].status(), RowStatus::Inactive);
    assert_eq!(diff.to_deactivate[0].status().status_id(), 0);
}

#[test]
fn creates_missing_rows_with_full_audit() {
    let diff = CombinatorialReconciler::new()
        .reconcile(
            &schema(EntityTypeId::Sensor),
            &selection(&[5], &[10, 11]),
            &[],
            stamp(),
        )
        .unwrap_or_else(|_| unreachable!())
        .diff;

    assert_eq!(keys(&diff.to_create), vec![vec![5, 10], vec![5, 11]]);
    let audit = diff.to_create[0].audit();
    assert_eq!(audit.created_by, Some(42));
    assert_eq!(audit.created_at, Some(stamp().at));
    assert_eq!(audit.modified_by, Some(42));
}

#[test]
fn empty_dimensions_are_reported_by_name() {
    let mut builder = RelationshipSetBuilder::new();
    builder.select(Dimension::Node, 1);

    let result = CombinatorialReconciler::new().reconcile(
        &schema(EntityTypeId::MetricSensor),
        &builder.build(),
        &[],
        stamp(),
    );

    let Err(AppError::MissingRequired(missing)) = result else {
        unreachable!("expected missing dimensions");
    };
    assert!(missing.fields.is_empty());
    assert_eq!(missing.dimensions, vec!["type".to_owned(), "metric".to_owned()]);
}

#[test]
fn single_entity_schemas_and_bad_keys_are_rejected() {
    let reconciler = CombinatorialReconciler::new();

    let no_dimensions = reconciler.reconcile(
        &schema(EntityTypeId::Country),
        &selection(&[1], &[10]),
        &[],
        stamp(),
    );
    assert!(matches!(no_dimensions, Err(AppError::Validation(_))));

    let wrong_arity = reconciler.reconcile(
        &schema(EntityTypeId::Sensor),
        &selection(&[1], &[10]),
        &[row(&[1, 10, 100], RowStatus::Active)],
        stamp(),
    );
    assert!(matches!(wrong_arity, Err(AppError::Validation(_))));
}

#[test]
fn undeclared_dimensions_are_ignored() {
    let mut builder = RelationshipSetBuilder::new();
    builder
        .select(Dimension::Node, 1)
        .select(Dimension::Type, 10)
        .select_many(Dimension::Metric, [7, 8, 9]);

    let product = CombinatorialReconciler::new()
        .cartesian_product(&builder.build(), &[Dimension::Node, Dimension::Type]);

    assert_eq!(product, vec![RelationshipKey::new(vec![1, 10])]);
}

#[test]
fn duplicate_keys_prefer_the_active_copy() {
    let existing = vec![row(&[1, 10], RowStatus::Inactive), row(&[1, 10], RowStatus::Active)];

    let diff = CombinatorialReconciler::new()
        .reconcile(
            &schema(EntityTypeId::Sensor),
            &selection(&[1], &[10]),
            &existing,
            stamp(),
        )
        .unwrap_or_else(|_| unreachable!())
        .diff;

    assert!(diff.is_empty());
}

#[test]
fn preview_counts_writes_and_fingerprints_the_snapshot() {
    let existing = vec![row(&[1, 10], RowStatus::Active), row(&[3, 10], RowStatus::Active)];

    let preview = CombinatorialReconciler::new()
        .preview(
            &schema(EntityTypeId::Sensor),
            &selection(&[1, 2], &[10]),
            &existing,
            stamp(),
        )
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(preview.total_count, 2);
    assert_eq!(keys(&preview.to_create), vec![vec![2, 10]]);
    assert_eq!(keys(&preview.to_deactivate), vec![vec![3, 10]]);
    assert_eq!(preview.diff().write_count(), 2);
    assert_eq!(
        preview.summary.to_string(),
        "2 nodes × 1 type = 2 combinations (0 to activate, 1 to create, 1 to deactivate, 1 unchanged)"
    );
    assert_eq!(
        Some(preview.fingerprint),
        super::SnapshotFingerprint::of(&existing).ok()
    );
}

fn arbitrary_rows() -> impl Strategy<Value = Vec<RelationshipRow>> {
    proptest::collection::vec((1_i64..6, 10_i64..14, any::<bool>()), 0..20).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(node, kind, active)| {
                let status = if active {
                    RowStatus::Active
                } else {
                    RowStatus::Inactive
                };
                row(&[node, kind], status)
            })
            .collect()
    })
}

fn arbitrary_selection() -> impl Strategy<Value = RelationshipSet> {
    (
        proptest::collection::btree_set(1_i64..6, 1..5),
        proptest::collection::btree_set(10_i64..14, 1..4),
    )
        .prop_map(|(nodes, types)| {
            let mut builder = RelationshipSetBuilder::new();
            builder
                .select_many(Dimension::Node, nodes)
                .select_many(Dimension::Type, types);
            builder.build()
        })
}

proptest! {
    #[test]
    fn applying_the_diff_reaches_a_fixed_point(
        existing in arbitrary_rows(),
        selection in arbitrary_selection(),
    ) {
        let schema = schema(EntityTypeId::Sensor);
        let reconciler = CombinatorialReconciler::new();

        let first = reconciler.reconcile(&schema, &selection, &existing, stamp());
        prop_assert!(first.is_ok());
        let first = first.unwrap_or_else(|_| unreachable!());
        let again = reconciler
            .reconcile(&schema, &selection, &existing, stamp())
            .unwrap_or_else(|_| unreachable!());
        prop_assert_eq!(&first, &again);

        let normalized = terrasense_domain::ExistingRows::Flat(existing).normalize();
        let applied = first.diff.apply_to(&normalized);
        let second = reconciler
            .reconcile(&schema, &selection, &applied, stamp())
            .unwrap_or_else(|_| unreachable!());
        prop_assert!(second.diff.is_empty());
    }

    #[test]
    fn diff_lists_partition_the_product(
        existing in arbitrary_rows(),
        selection in arbitrary_selection(),
    ) {
        let schema = schema(EntityTypeId::Sensor);
        let reconciler = CombinatorialReconciler::new();
        let diff = reconciler
            .reconcile(&schema, &selection, &existing, stamp())
            .unwrap_or_else(|_| unreachable!())
            .diff;

        let activate: BTreeSet<RelationshipKey> =
            diff.to_activate.iter().map(|row| row.key().clone()).collect();
        let create: BTreeSet<RelationshipKey> =
            diff.to_create.iter().map(|row| row.key().clone()).collect();
        let deactivate: BTreeSet<RelationshipKey> =
            diff.to_deactivate.iter().map(|row| row.key().clone()).collect();
        prop_assert!(activate.is_disjoint(&create));
        prop_assert!(activate.is_disjoint(&deactivate));
        prop_assert!(create.is_disjoint(&deactivate));

        let product: BTreeSet<RelationshipKey> = reconciler
            .cartesian_product(&selection, schema.dimensions())
            .into_iter()
            .collect();
        let normalized = terrasense_domain::ExistingRows::Flat(existing).normalize();
        let already_active: BTreeSet<RelationshipKey> = normalized
            .iter()
            .filter(|row| row.status().is_active() && product.contains(row.key()))
            .map(|row| row.key().clone())
            .collect();
        let covered: BTreeSet<RelationshipKey> = activate
            .union(&create)
            .cloned()
            .chain(already_active)
            .collect();
        prop_assert_eq!(&covered, &product);

        let expected_deactivate: BTreeSet<RelationshipKey> = normalized
            .iter()
            .filter(|row| row.status().is_active() && !product.contains(row.key()))
            .map(|row| row.key().clone())
            .collect();
        prop_assert_eq!(deactivate, expected_deactivate);
    }
}
