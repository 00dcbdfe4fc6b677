use std::sync::Arc;

use serde::Deserialize;
use terrasense_application::{
    ChangeInterceptor, FormSession, NavigationContext, ParameterService, ScopeKey,
    UnsavedChangesDetector,
};
use terrasense_core::{Actor, AppError, AppResult};
use terrasense_domain::{
    DependencyGraph, EntityTypeId, ExistingRows, FormMode, FormValues, NavigationKind,
    NavigationLabels, RelationshipSet, RelationshipSetBuilder,
};
use terrasense_infrastructure::InMemoryParameterRepository;
use tracing::{info, warn};

use crate::config::ConsoleConfig;
use crate::dto::{
    FieldPropsResponse, NavigationResponse, ReconciliationPreviewResponse, ScenarioReport,
};

/// One recorded console interaction replayed by the driver.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Storage name or alias, e.g. `fundo` or `farm`.
    pub entity_type: String,
    #[serde(default = "default_mode")]
    pub mode: FormMode,
    #[serde(default)]
    pub scope: ScopeKey,
    #[serde(default)]
    pub values: FormValues,
    #[serde(default)]
    pub staged_edits: Vec<FormValues>,
    #[serde(default)]
    pub existing: Option<ExistingRows>,
    #[serde(default)]
    pub selection: RelationshipSet,
    #[serde(default)]
    pub navigation: Option<NavigationScenario>,
}

/// Navigation attempted after the edits.
#[derive(Debug, Deserialize)]
pub struct NavigationScenario {
    pub kind: NavigationKind,
    pub current: String,
    pub target: String,
    #[serde(default)]
    pub decision: Option<NavigationDecision>,
}

/// Answer given to the confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDecision {
    Confirm,
    Cancel,
}

fn default_mode() -> FormMode {
    FormMode::Insert
}

/// Replays a scenario against an in-memory store seeded with its rows.
pub async fn run(config: &ConsoleConfig, scenario: Scenario) -> AppResult<ScenarioReport> {
    let entity_type: EntityTypeId = scenario.entity_type.parse()?;
    let graph = Arc::new(DependencyGraph::standard()?);
    let schema = graph.require_schema(entity_type)?;

    let repository = Arc::new(InMemoryParameterRepository::new());
    if let Some(existing) = scenario.existing {
        repository
            .seed_rows(entity_type, scenario.scope.clone(), existing.normalize())
            .await;
    }
    let service = ParameterService::new(repository, graph.clone());
    let actor = Actor::new(config.actor_id, format!("console-{}", config.actor_id));

    let mut session = match scenario.mode {
        FormMode::Insert => FormSession::insert(schema, scenario.values),
        FormMode::Update => FormSession::update(schema, scenario.values),
        FormMode::Massive => FormSession::massive(schema),
        FormMode::Multiple => FormSession::multiple(schema, scenario.values),
    };
    for edit in scenario.staged_edits {
        session.stage_edit(edit)?;
    }
    *session.selections_mut() = RelationshipSetBuilder::from(scenario.selection);

    let field_props = schema
        .fields()
        .iter()
        .map(|field| {
            FieldPropsResponse::new(
                field.name(),
                service
                    .evaluator()
                    .field_props(entity_type, field.name(), session.values()),
            )
        })
        .collect();
    let detector = UnsavedChangesDetector::new(graph.clone());
    let dirty = detector.is_dirty(&session.dirty_check());

    let selection = session.relationship_set();
    let wants_preview = schema.is_relationship()
        && matches!(session.mode(), FormMode::Insert | FormMode::Multiple)
        && !selection.is_empty();
    let (preview, preview_error) = if wants_preview {
        match service
            .preview_relationships(&actor, entity_type, &scenario.scope, &selection)
            .await
        {
            Ok(preview) => (Some(preview), None),
            Err(AppError::MissingRequired(missing)) => {
                warn!(entity_type = %entity_type, %missing, "incomplete relationship selection");
                (None, Some(missing.to_string()))
            }
            Err(error) => return Err(error),
        }
    } else {
        (None, None)
    };

    let navigation = scenario.navigation.map(|navigation| {
        let mut interceptor = ChangeInterceptor::new(detector, NavigationLabels::standard());
        let destination = navigation.target.clone();
        let outcome = interceptor.request_navigation(
            navigation.kind,
            navigation.target,
            NavigationContext::new(
                navigation.current,
                session.dirty_check(),
                Box::new(move || info!(destination = %destination, "navigated")),
            ),
        );
        let response = NavigationResponse::new(outcome, interceptor.pending_change_info());

        match navigation.decision {
            Some(NavigationDecision::Confirm) => {
                interceptor.confirm();
            }
            Some(NavigationDecision::Cancel) => {
                interceptor.cancel();
            }
            None => {}
        }

        response
    });

    let receipt = if !config.apply {
        None
    } else if let Some(preview) = &preview {
        Some(
            service
                .submit_relationships(
                    &actor,
                    entity_type,
                    &scenario.scope,
                    &selection,
                    &preview.fingerprint,
                )
                .await?,
        )
    } else if schema.is_relationship() {
        None
    } else {
        Some(service.submit_form(&actor, &session).await?)
    };

    Ok(ScenarioReport {
        entity_type: entity_type.as_str().to_owned(),
        mode: session.mode().as_str().to_owned(),
        dirty,
        field_props,
        preview: preview.as_ref().map(ReconciliationPreviewResponse::from),
        preview_error,
        navigation,
        receipt: receipt.map(Into::into),
    })
}
