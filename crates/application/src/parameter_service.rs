use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use terrasense_core::{Actor, AppError, AppResult};
use terrasense_domain::{
    AuditStamp, DependencyGraph, EntityFormSchema, EntityTypeId, FormMode, FormValues,
    RelationshipSet,
};
use tracing::{info, warn};

use crate::enablement_evaluator::EnablementEvaluator;
use crate::form_session::FormSession;
use crate::parameter_ports::{ParameterRepository, ScopeKey, SubmitOutcome, SubmitPayload};
use crate::reconciler::{CombinatorialReconciler, ReconciliationPreview, SnapshotFingerprint};

/// What a submission wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Target entity type.
    pub entity_type: EntityTypeId,
    /// Rows or records sent to the store; zero when nothing needed writing.
    pub write_count: usize,
}

impl SubmitReceipt {
    /// Returns true when a payload was sent.
    #[must_use]
    pub fn submitted(&self) -> bool {
        self.write_count > 0
    }
}

/// Application service validating and submitting parameter edits.
#[derive(Clone)]
pub struct ParameterService {
    repository: Arc<dyn ParameterRepository>,
    evaluator: EnablementEvaluator,
    reconciler: CombinatorialReconciler,
}

impl ParameterService {
    /// Creates a service over a repository implementation and form catalog.
    #[must_use]
    pub fn new(repository: Arc<dyn ParameterRepository>, graph: Arc<DependencyGraph>) -> Self {
        Self {
            repository,
            evaluator: EnablementEvaluator::new(graph),
            reconciler: CombinatorialReconciler::new(),
        }
    }

    /// Returns the evaluator sharing this service's catalog.
    #[must_use]
    pub fn evaluator(&self) -> &EnablementEvaluator {
        &self.evaluator
    }

    /// Fetches the stored rows and computes what a bulk submit would write.
    pub async fn preview_relationships(
        &self,
        actor: &Actor,
        entity_type: EntityTypeId,
        scope: &ScopeKey,
        selection: &RelationshipSet,
    ) -> AppResult<ReconciliationPreview> {
        let schema = self.evaluator.graph().require_schema(entity_type)?;
        let existing = self.repository.list_existing(entity_type, scope).await?;

        self.reconciler
            .preview(schema, selection, &existing, stamp(actor))
    }

    /// Re-fetches the stored rows and writes the diff if they are unchanged
    /// since the preview fingerprinted them.
    pub async fn submit_relationships(
        &self,
        actor: &Actor,
        entity_type: EntityTypeId,
        scope: &ScopeKey,
        selection: &RelationshipSet,
        expected: &SnapshotFingerprint,
    ) -> AppResult<SubmitReceipt> {
        let schema = self.evaluator.graph().require_schema(entity_type)?;
        let existing = self.repository.list_existing(entity_type, scope).await?;

        let current = SnapshotFingerprint::of(&existing)?;
        if &current != expected {
            warn!(
                actor = actor.login(),
                entity_type = %entity_type,
                scope = %scope,
                "relationship rows changed since preview"
            );
            return Err(AppError::StaleSnapshot(format!(
                "rows of '{}' in scope '{scope}' changed since the preview, please retry",
                entity_type.as_str()
            )));
        }

        let reconciliation = self
            .reconciler
            .reconcile(schema, selection, &existing, stamp(actor))?;
        if reconciliation.diff.is_empty() {
            info!(
                actor = actor.login(),
                entity_type = %entity_type,
                scope = %scope,
                "relationship selection already stored"
            );
            return Ok(SubmitReceipt {
                entity_type,
                write_count: 0,
            });
        }

        let write_count = reconciliation.diff.write_count();
        let outcome = self
            .repository
            .submit(
                entity_type,
                SubmitPayload::Relationships {
                    scope: scope.clone(),
                    dimensions: schema.dimensions().to_vec(),
                    diff: reconciliation.diff,
                },
            )
            .await?;
        ensure_accepted(entity_type, outcome)?;

        info!(
            actor = actor.login(),
            entity_type = %entity_type,
            scope = %scope,
            summary = %reconciliation.summary,
            "submitted relationship changes"
        );

        Ok(SubmitReceipt {
            entity_type,
            write_count,
        })
    }

    /// Validates a single-entity form and writes it.
    pub async fn submit_form(
        &self,
        actor: &Actor,
        session: &FormSession,
    ) -> AppResult<SubmitReceipt> {
        let entity_type = session.entity_type();
        let schema = session.schema();
        if schema.is_relationship() {
            return Err(AppError::Validation(format!(
                "'{}' rows are written through bulk relationship submit",
                entity_type.as_str()
            )));
        }

        let audit = stamp(actor);
        let payload = match session.mode() {
            FormMode::Insert => {
                self.evaluator
                    .validate_required(entity_type, session.values())?;

                let mut values: FormValues = self
                    .evaluator
                    .enabled_fields(entity_type, session.values())
                    .into_iter()
                    .filter_map(|field| {
                        session
                            .value(&field)
                            .map(|value| (field.clone(), value.clone()))
                    })
                    .collect();
                stamp_created(&mut values, audit);
                SubmitPayload::Record {
                    mode: FormMode::Insert,
                    values,
                }
            }
            FormMode::Update => {
                self.evaluator
                    .validate_required(entity_type, session.values())?;

                let edits = session.edits();
                if edits.is_empty() {
                    return Ok(SubmitReceipt {
                        entity_type,
                        write_count: 0,
                    });
                }

                let mut values = record_key(schema, session.baseline());
                values.extend(edits);
                stamp_modified(&mut values, audit);
                SubmitPayload::Record {
                    mode: FormMode::Update,
                    values,
                }
            }
            FormMode::Massive => {
                if session.staged_edits().is_empty() {
                    return Err(AppError::Validation(format!(
                        "no staged edits for '{}'",
                        entity_type.as_str()
                    )));
                }

                let records = session
                    .staged_edits()
                    .iter()
                    .map(|edit| {
                        let mut values = edit.clone();
                        stamp_modified(&mut values, audit);
                        values
                    })
                    .collect();
                SubmitPayload::Batch { records }
            }
            FormMode::Multiple => {
                return Err(AppError::Validation(format!(
                    "'{}' has no bulk relationship editor",
                    entity_type.as_str()
                )));
            }
        };

        let write_count = match &payload {
            SubmitPayload::Batch { records } => records.len(),
            _ => 1,
        };
        let outcome = self.repository.submit(entity_type, payload).await?;
        ensure_accepted(entity_type, outcome)?;

        info!(
            actor = actor.login(),
            entity_type = %entity_type,
            mode = session.mode().as_str(),
            write_count,
            "submitted parameter form"
        );

        Ok(SubmitReceipt {
            entity_type,
            write_count,
        })
    }
}

fn stamp(actor: &Actor) -> AuditStamp {
    AuditStamp::new(actor.user_id(), Utc::now())
}

fn stamp_created(values: &mut FormValues, stamp: AuditStamp) {
    values.insert("createdBy".to_owned(), Value::from(stamp.user_id));
    values.insert("createdAt".to_owned(), Value::from(stamp.at.to_rfc3339()));
    stamp_modified(values, stamp);
}

fn stamp_modified(values: &mut FormValues, stamp: AuditStamp) {
    values.insert("modifiedBy".to_owned(), Value::from(stamp.user_id));
    values.insert("modifiedAt".to_owned(), Value::from(stamp.at.to_rfc3339()));
}

const AUDIT_COLUMNS: [&str; 4] = ["createdBy", "createdAt", "modifiedBy", "modifiedAt"];

/// Columns of the fetched row that are neither form fields nor audit columns identify the record.
fn record_key(schema: &EntityFormSchema, baseline: Option<&FormValues>) -> FormValues {
    baseline
        .map(|baseline| {
            baseline
                .iter()
                .filter(|(field, _)| {
                    schema.field(field).is_none() && !AUDIT_COLUMNS.contains(&field.as_str())
                })
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn ensure_accepted(entity_type: EntityTypeId, outcome: SubmitOutcome) -> AppResult<()> {
    if outcome.success {
        return Ok(());
    }

    let reason = outcome
        .error
        .unwrap_or_else(|| "submission rejected by the store".to_owned());
    warn!(entity_type = %entity_type, reason = %reason, "submission rejected");

    Err(AppError::Conflict(format!(
        "'{}' submission rejected: {reason}",
        entity_type.as_str()
    )))
}
