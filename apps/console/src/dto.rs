use serde::Serialize;
use terrasense_application::{
    FieldProps, NavigationOutcome, PendingChangeInfo, ReconciliationPreview, SubmitReceipt,
};
use terrasense_domain::RelationshipRow;
use ts_rs::TS;

/// Widget flags of one form field.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/field-props-response.ts"
)]
pub struct FieldPropsResponse {
    pub field: String,
    pub disabled: bool,
    pub required: bool,
}

impl FieldPropsResponse {
    pub fn new(field: impl Into<String>, props: FieldProps) -> Self {
        Self {
            field: field.into(),
            disabled: props.disabled,
            required: props.required,
        }
    }
}

/// Console representation of one relationship row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/relationship-row-response.ts"
)]
pub struct RelationshipRowResponse {
    #[ts(type = "Array<number>")]
    pub key: Vec<i64>,
    #[ts(type = "number")]
    pub status_id: i64,
    #[ts(type = "number | null")]
    pub modified_by: Option<i64>,
    pub modified_at: Option<String>,
}

impl From<&RelationshipRow> for RelationshipRowResponse {
    fn from(value: &RelationshipRow) -> Self {
        Self {
            key: value.key().ids().to_vec(),
            status_id: value.status().status_id(),
            modified_by: value.audit().modified_by,
            modified_at: value.audit().modified_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Confirmation data shown before a bulk relationship submit.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/reconciliation-preview-response.ts"
)]
pub struct ReconciliationPreviewResponse {
    pub to_activate: Vec<RelationshipRowResponse>,
    pub to_create: Vec<RelationshipRowResponse>,
    pub to_deactivate: Vec<RelationshipRowResponse>,
    pub total_count: usize,
    pub total_combinations: usize,
    pub summary: String,
    pub fingerprint: String,
}

impl From<&ReconciliationPreview> for ReconciliationPreviewResponse {
    fn from(value: &ReconciliationPreview) -> Self {
        Self {
            to_activate: value.to_activate.iter().map(Into::into).collect(),
            to_create: value.to_create.iter().map(Into::into).collect(),
            to_deactivate: value.to_deactivate.iter().map(Into::into).collect(),
            total_count: value.total_count,
            total_combinations: value.summary.total_combinations,
            summary: value.summary.to_string(),
            fingerprint: value.fingerprint.as_str().to_owned(),
        }
    }
}

/// Confirmation dialog state.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/pending-change-response.ts"
)]
pub struct PendingChangeResponse {
    pub is_open: bool,
    pub kind: String,
    pub current_label: String,
    pub target_label: String,
}

impl From<PendingChangeInfo> for PendingChangeResponse {
    fn from(value: PendingChangeInfo) -> Self {
        Self {
            is_open: value.is_open,
            kind: value.kind.as_str().to_owned(),
            current_label: value.current_label,
            target_label: value.target_label,
        }
    }
}

/// Result of a guarded navigation request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/navigation-response.ts"
)]
pub struct NavigationResponse {
    pub outcome: String,
    pub pending_change: Option<PendingChangeResponse>,
}

impl NavigationResponse {
    pub fn new(outcome: NavigationOutcome, pending_change: Option<PendingChangeInfo>) -> Self {
        let outcome = match outcome {
            NavigationOutcome::Proceeded => "proceeded",
            NavigationOutcome::Blocked => "blocked",
        };

        Self {
            outcome: outcome.to_owned(),
            pending_change: pending_change.map(Into::into),
        }
    }
}

/// What a submission wrote.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/submit-receipt-response.ts"
)]
pub struct SubmitReceiptResponse {
    pub entity_type: String,
    pub write_count: usize,
    pub submitted: bool,
}

impl From<SubmitReceipt> for SubmitReceiptResponse {
    fn from(value: SubmitReceipt) -> Self {
        Self {
            entity_type: value.entity_type.as_str().to_owned(),
            write_count: value.write_count,
            submitted: value.submitted(),
        }
    }
}

/// Everything one scenario run produced.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/scenario-report.ts"
)]
pub struct ScenarioReport {
    pub entity_type: String,
    pub mode: String,
    pub dirty: bool,
    pub field_props: Vec<FieldPropsResponse>,
    pub preview: Option<ReconciliationPreviewResponse>,
    pub preview_error: Option<String>,
    pub navigation: Option<NavigationResponse>,
    pub receipt: Option<SubmitReceiptResponse>,
}
