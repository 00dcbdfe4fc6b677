//! Application services and ports.

#![forbid(unsafe_code)]

mod change_interceptor;
mod enablement_evaluator;
mod form_session;
mod parameter_ports;
mod parameter_service;
mod reconciler;
mod unsaved_changes;

pub use change_interceptor::{
    ChangeInterceptor, InterceptorState, NavigationCallback, NavigationContext, NavigationOutcome,
    PendingChange, PendingChangeInfo,
};
pub use enablement_evaluator::{EnablementEvaluator, FieldProps};
pub use form_session::FormSession;
pub use parameter_ports::{ParameterRepository, ScopeKey, SubmitOutcome, SubmitPayload};
pub use parameter_service::{ParameterService, SubmitReceipt};
pub use reconciler::{
    CombinatorialReconciler, Reconciliation, ReconciliationPreview, SnapshotFingerprint,
};
pub use unsaved_changes::{DirtyCheck, UnsavedChangesDetector};
