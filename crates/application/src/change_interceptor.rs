use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};
use terrasense_domain::{NavigationKind, NavigationLabels};
use tracing::debug;

use crate::unsaved_changes::{DirtyCheck, UnsavedChangesDetector};

/// Callback run when a navigation is allowed or abandoned.
pub type NavigationCallback = Box<dyn FnOnce()>;

/// Everything the interceptor needs to judge one navigation attempt.
pub struct NavigationContext {
    /// Key of the sub-tab, parameter or tab currently shown.
    pub current: String,
    /// State of the form being left.
    pub state: DirtyCheck,
    /// Performs the navigation, including any reset of the form being left.
    pub on_confirm: NavigationCallback,
    /// Restores the UI when the user keeps editing.
    pub on_cancel: NavigationCallback,
}

impl NavigationContext {
    /// Creates a context with a no-op cancel callback.
    #[must_use]
    pub fn new(current: impl Into<String>, state: DirtyCheck, on_confirm: NavigationCallback) -> Self {
        Self {
            current: current.into(),
            state,
            on_confirm,
            on_cancel: Box::new(|| {}),
        }
    }

    /// Sets the cancel callback.
    #[must_use]
    pub fn with_on_cancel(mut self, on_cancel: NavigationCallback) -> Self {
        self.on_cancel = on_cancel;
        self
    }
}

/// Navigation parked until the user confirms or cancels it.
pub struct PendingChange {
    kind: NavigationKind,
    current: String,
    target: String,
    on_confirm: NavigationCallback,
    on_cancel: NavigationCallback,
}

impl PendingChange {
    /// Returns the navigation class.
    #[must_use]
    pub fn kind(&self) -> NavigationKind {
        self.kind
    }

    /// Returns the key being left.
    #[must_use]
    pub fn current(&self) -> &str {
        self.current.as_str()
    }

    /// Returns the requested key.
    #[must_use]
    pub fn target(&self) -> &str {
        self.target.as_str()
    }
}

impl Debug for PendingChange {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PendingChange")
            .field("kind", &self.kind)
            .field("current", &self.current)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Interceptor state.
#[derive(Debug, Default)]
pub enum InterceptorState {
    /// Nothing awaits confirmation.
    #[default]
    Idle,
    /// One navigation awaits the user's decision.
    PendingConfirmation(PendingChange),
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// The form was clean and the navigation already ran.
    Proceeded,
    /// The form holds unsaved edits; a confirmation is pending.
    Blocked,
}

/// Data the confirmation dialog renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChangeInfo {
    /// Dialog visibility.
    pub is_open: bool,
    /// Navigation class.
    pub kind: NavigationKind,
    /// Label of what is being left.
    pub current_label: String,
    /// Label of the requested destination.
    pub target_label: String,
}

/// Guards sub-tab, parameter and tab switches against silently dropping edits.
pub struct ChangeInterceptor {
    detector: UnsavedChangesDetector,
    labels: NavigationLabels,
    state: InterceptorState,
}

impl ChangeInterceptor {
    /// Creates an idle interceptor.
    #[must_use]
    pub fn new(detector: UnsavedChangesDetector, labels: NavigationLabels) -> Self {
        Self {
            detector,
            labels,
            state: InterceptorState::Idle,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> &InterceptorState {
        &self.state
    }

    /// Returns the parked navigation, if any.
    #[must_use]
    pub fn pending_change(&self) -> Option<&PendingChange> {
        match &self.state {
            InterceptorState::Idle => None,
            InterceptorState::PendingConfirmation(pending) => Some(pending),
        }
    }

    /// Runs the navigation when the form is clean, parks it otherwise.
    ///
    /// A request arriving while another one is parked replaces it; the
    /// replaced change is dropped without running either callback.
    pub fn request_navigation(
        &mut self,
        kind: NavigationKind,
        target: impl Into<String>,
        context: NavigationContext,
    ) -> NavigationOutcome {
        let target = target.into();

        if let InterceptorState::PendingConfirmation(discarded) =
            std::mem::take(&mut self.state)
        {
            debug!(
                discarded_kind = discarded.kind.as_str(),
                discarded_target = %discarded.target,
                kind = kind.as_str(),
                target = %target,
                "replaced pending navigation"
            );
        }

        if !self.detector.is_dirty(&context.state) {
            debug!(kind = kind.as_str(), target = %target, "navigation proceeded");
            (context.on_confirm)();
            return NavigationOutcome::Proceeded;
        }

        debug!(
            kind = kind.as_str(),
            current = %context.current,
            target = %target,
            entity_type = %context.state.entity_type,
            "navigation blocked by unsaved changes"
        );
        self.state = InterceptorState::PendingConfirmation(PendingChange {
            kind,
            current: context.current,
            target,
            on_confirm: context.on_confirm,
            on_cancel: context.on_cancel,
        });

        NavigationOutcome::Blocked
    }

    /// Runs the parked navigation. Returns false when nothing was pending.
    pub fn confirm(&mut self) -> bool {
        let Some(pending) = self.take_pending() else {
            debug!("confirm with no pending navigation");
            return false;
        };

        debug!(kind = pending.kind.as_str(), target = %pending.target, "navigation confirmed");
        (pending.on_confirm)();
        true
    }

    /// Abandons the parked navigation. Returns false when nothing was pending.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.take_pending() else {
            debug!("cancel with no pending navigation");
            return false;
        };

        debug!(kind = pending.kind.as_str(), target = %pending.target, "navigation cancelled");
        (pending.on_cancel)();
        true
    }

    /// Returns the dialog data for the parked navigation.
    #[must_use]
    pub fn pending_change_info(&self) -> Option<PendingChangeInfo> {
        self.pending_change().map(|pending| PendingChangeInfo {
            is_open: true,
            kind: pending.kind,
            current_label: self.labels.label(pending.kind, &pending.current),
            target_label: self.labels.label(pending.kind, &pending.target),
        })
    }

    fn take_pending(&mut self) -> Option<PendingChange> {
        match std::mem::take(&mut self.state) {
            InterceptorState::Idle => None,
            InterceptorState::PendingConfirmation(pending) => Some(pending),
        }
    }
}

impl Debug for ChangeInterceptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ChangeInterceptor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
