use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Value, json};
use terrasense_domain::{
    DependencyGraph, Dimension, EntityFormSchema, EntityTypeId, FormMode, FormValues,
};

use super::FormSession;
use crate::UnsavedChangesDetector;

fn schema(entity_type: EntityTypeId) -> EntityFormSchema {
    DependencyGraph::standard()
        .and_then(|graph| graph.require_schema(entity_type).cloned())
        .unwrap_or_else(|_| unreachable!())
}

fn detector() -> UnsavedChangesDetector {
    UnsavedChangesDetector::new(Arc::new(
        DependencyGraph::standard().unwrap_or_else(|_| unreachable!()),
    ))
}

#[test]
fn insert_session_starts_from_defaults_and_context() {
    let session = FormSession::insert(
        &schema(EntityTypeId::Farm),
        FormValues::from([
            ("companyId".to_owned(), json!(4)),
            ("unrelated".to_owned(), json!("ignored")),
        ]),
    );

    assert_eq!(session.mode(), FormMode::Insert);
    assert_eq!(session.value("companyId"), Some(&json!(4)));
    assert_eq!(session.value("farm"), Some(&json!("")));
    assert_eq!(session.value("statusFlag"), Some(&json!(true)));
    assert!(session.value("unrelated").is_none());
}

#[test]
fn clearing_a_chain_field_resets_everything_after_it() {
    let mut session = FormSession::insert(&schema(EntityTypeId::Country), FormValues::new());
    assert!(session.set_value("country", json!("Peru")).is_ok());
    assert!(session.set_value("countryAbbrev", json!("PE")).is_ok());

    let reset = session.clear_field("country").unwrap_or_default();

    assert_eq!(reset, vec!["countryAbbrev".to_owned()]);
    assert_eq!(session.value("country"), Some(&json!("")));
    assert_eq!(session.value("countryAbbrev"), Some(&json!("")));
}

#[test]
fn changing_a_chain_field_restores_downstream_defaults() {
    let mut session = FormSession::insert(&schema(EntityTypeId::Node), FormValues::new());
    for (field, value) in [
        ("node", json!("N-01")),
        ("devEui", json!("70B3D5")),
        ("appEui", json!("A1")),
        ("statusFlag", json!(false)),
    ] {
        assert!(session.set_value(field, value).is_ok());
    }

    let reset = session
        .set_value("devEui", json!("70B3D6"))
        .unwrap_or_default();

    assert_eq!(reset, vec!["appEui".to_owned(), "statusFlag".to_owned()]);
    assert_eq!(session.value("appEui"), Some(&json!("")));
    assert_eq!(session.value("statusFlag"), Some(&json!(true)));
    assert_eq!(session.value("node"), Some(&json!("N-01")));
}

#[test]
fn unchanged_values_do_not_cascade() {
    let mut session = FormSession::insert(&schema(EntityTypeId::Country), FormValues::new());
    assert!(session.set_value("country", json!("Peru")).is_ok());
    assert!(session.set_value("countryAbbrev", json!("PE")).is_ok());

    let reset = session.set_value("country", json!(" Peru ")).unwrap_or_default();
    assert!(reset.is_empty());
    assert_eq!(session.value("countryAbbrev"), Some(&json!("PE")));
}

#[test]
fn non_chain_rules_reset_fields_they_disable() {
    let mut session = FormSession::insert(&schema(EntityTypeId::Criticality), FormValues::new());
    for (field, value) in [
        ("criticality", json!("High")),
        ("frequency", json!(15)),
        ("escalation", json!(3)),
    ] {
        assert!(session.set_value(field, value).is_ok());
    }

    let reset = session.clear_field("criticality").unwrap_or_default();

    assert_eq!(reset, vec!["escalation".to_owned(), "frequency".to_owned()]);
    assert_eq!(session.value("escalation"), Some(&Value::Null));
}

#[test]
fn unknown_fields_are_rejected() {
    let mut session = FormSession::insert(&schema(EntityTypeId::Country), FormValues::new());
    assert!(session.set_value("planet", json!("Earth")).is_err());
    assert!(session.clear_field("planet").is_err());
}

#[test]
fn update_edits_are_relative_to_the_fetched_row() {
    let mut session = FormSession::update(
        &schema(EntityTypeId::Metric),
        FormValues::from([
            ("metric".to_owned(), json!("Temperature")),
            ("unit".to_owned(), json!("C")),
        ]),
    );
    assert!(session.edits().is_empty());

    assert!(session.set_value("unit", json!("F")).is_ok());
    assert_eq!(
        session.edits(),
        FormValues::from([("unit".to_owned(), json!("F"))])
    );

    session.reset();
    assert!(session.edits().is_empty());
    assert_eq!(session.value("unit"), Some(&json!("C")));
}

#[test]
fn filling_an_empty_optional_number_with_zero_is_an_edit() {
    let mut session = FormSession::update(
        &schema(EntityTypeId::Criticality),
        FormValues::from([
            ("criticality".to_owned(), json!("High")),
            ("frequency".to_owned(), json!(15)),
            ("escalation".to_owned(), Value::Null),
        ]),
    );
    assert!(!detector().is_dirty(&session.dirty_check()));

    assert!(session.set_value("escalation", json!(0)).is_ok());

    assert_eq!(
        session.edits(),
        FormValues::from([("escalation".to_owned(), json!(0))])
    );
    assert!(detector().is_dirty(&session.dirty_check()));
}

#[test]
fn mounted_context_alone_leaves_insert_form_clean() {
    let mut session = FormSession::insert(
        &schema(EntityTypeId::GeoPoint),
        FormValues::from([("locationId".to_owned(), json!(3))]),
    );
    assert_eq!(session.value("locationId"), Some(&json!(3)));
    assert!(!detector().is_dirty(&session.dirty_check()));

    assert!(session.set_value("locationId", json!(4)).is_ok());
    assert!(detector().is_dirty(&session.dirty_check()));
}

#[test]
fn staged_edits_accept_declared_fields_and_the_record_key() {
    let mut session = FormSession::massive(&schema(EntityTypeId::Metric));

    let keyed = session.stage_edit(FormValues::from([
        ("metricId".to_owned(), json!(7)),
        ("unit".to_owned(), json!("K")),
    ]));
    let unknown = session.stage_edit(FormValues::from([
        ("metricId".to_owned(), json!(8)),
        ("colour".to_owned(), json!("red")),
    ]));

    assert!(keyed.is_ok());
    assert!(unknown.is_err());
    assert_eq!(session.staged_edits().len(), 1);
}

#[test]
fn reset_restores_context_and_clears_selections() {
    let mut session = FormSession::multiple(
        &schema(EntityTypeId::Sensor),
        FormValues::from([("entityId".to_owned(), json!(2))]),
    );
    session
        .selections_mut()
        .select(Dimension::Node, 1)
        .select(Dimension::Type, 10);
    assert_eq!(session.relationship_set().count(Dimension::Node), 1);

    session.reset();

    assert!(session.relationship_set().is_empty());
    assert_eq!(session.value("entityId"), Some(&json!(2)));
}

#[test]
fn staging_moves_values_into_the_bulk_list() {
    let mut session = FormSession::massive(&schema(EntityTypeId::Metric));
    assert!(session.set_value("metric", json!("Humidity")).is_ok());

    session.stage_current();

    assert_eq!(session.staged_edits().len(), 1);
    assert_eq!(session.value("metric"), Some(&json!("")));
    assert_eq!(session.dirty_check().staged_edits.len(), 1);
}

proptest! {
    #[test]
    fn clearing_any_threshold_step_resets_all_later_steps(step in 0_usize..6) {
        let schema = schema(EntityTypeId::Threshold);
        let mut session = FormSession::insert(&schema, FormValues::new());
        let filled = [
            ("name", json!("Frost")),
            ("locationId", json!(1)),
            ("criticalityId", json!(2)),
            ("nodeId", json!(3)),
            ("metricId", json!(4)),
            ("typeId", json!(5)),
        ];
        for (field, value) in filled.iter() {
            prop_assert!(session.set_value(field, value.clone()).is_ok());
        }

        let (cleared, _) = &filled[step];
        prop_assert!(session.clear_field(cleared).is_ok());

        for (field, value) in filled.iter().skip(step + 1) {
            prop_assert_ne!(session.value(field), Some(value));
            prop_assert!(
                session
                    .value(field)
                    .is_some_and(terrasense_domain::is_empty_value)
            );
        }
        for (field, value) in filled.iter().take(step) {
            prop_assert_eq!(session.value(field), Some(value));
        }
    }
}
