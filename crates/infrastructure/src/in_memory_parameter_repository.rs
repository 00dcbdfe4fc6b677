use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use terrasense_application::{ParameterRepository, ScopeKey, SubmitOutcome, SubmitPayload};
use terrasense_core::AppResult;
use terrasense_domain::{Dimension, EntityTypeId, ReconciliationDiff, RelationshipKey, RelationshipRow};
use tokio::sync::RwLock;
use tracing::{debug, info};

type ScopedRows = BTreeMap<RelationshipKey, RelationshipRow>;

/// In-memory parameter repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryParameterRepository {
    rows: RwLock<HashMap<(EntityTypeId, ScopeKey), ScopedRows>>,
    submissions: RwLock<HashMap<EntityTypeId, Vec<SubmitPayload>>>,
}

impl InMemoryParameterRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            submissions: RwLock::new(HashMap::new()),
        }
    }

    /// Stores rows as if they had been fetched from the database.
    ///
    /// A later row with the same key replaces an earlier one.
    pub async fn seed_rows(
        &self,
        entity_type: EntityTypeId,
        scope: ScopeKey,
        rows: impl IntoIterator<Item = RelationshipRow>,
    ) {
        let mut stored = self.rows.write().await;
        let scoped = stored.entry((entity_type, scope)).or_default();
        for row in rows {
            scoped.insert(row.key().clone(), row);
        }
    }

    /// Returns every accepted submission of one entity type, oldest first.
    pub async fn submissions(&self, entity_type: EntityTypeId) -> Vec<SubmitPayload> {
        self.submissions
            .read()
            .await
            .get(&entity_type)
            .cloned()
            .unwrap_or_default()
    }

    async fn apply_relationships(
        &self,
        entity_type: EntityTypeId,
        scope: &ScopeKey,
        dimensions: &[Dimension],
        diff: &ReconciliationDiff,
    ) -> Option<String> {
        let mut stored = self.rows.write().await;
        let scoped = stored.entry((entity_type, scope.clone())).or_default();

        if let Some(row) = diff.rows().find(|row| row.key().arity() != dimensions.len()) {
            return Some(format!(
                "row {} does not match {} dimension(s)",
                row.key(),
                dimensions.len()
            ));
        }
        if let Some(row) = diff
            .to_create
            .iter()
            .find(|row| scoped.contains_key(row.key()))
        {
            return Some(format!("row {} already exists", row.key()));
        }
        if let Some(row) = diff
            .to_activate
            .iter()
            .chain(diff.to_deactivate.iter())
            .find(|row| !scoped.contains_key(row.key()))
        {
            return Some(format!("row {} does not exist", row.key()));
        }

        for row in diff.rows() {
            scoped.insert(row.key().clone(), row.clone());
        }
        debug!(
            entity_type = %entity_type,
            scope = %scope,
            written = diff.write_count(),
            "applied relationship diff"
        );

        None
    }
}

#[async_trait]
impl ParameterRepository for InMemoryParameterRepository {
    async fn list_existing(
        &self,
        entity_type: EntityTypeId,
        scope: &ScopeKey,
    ) -> AppResult<Vec<RelationshipRow>> {
        Ok(self
            .rows
            .read()
            .await
            .get(&(entity_type, scope.clone()))
            .map(|scoped| scoped.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn submit(
        &self,
        entity_type: EntityTypeId,
        payload: SubmitPayload,
    ) -> AppResult<SubmitOutcome> {
        if let SubmitPayload::Relationships {
            scope,
            dimensions,
            diff,
        } = &payload
            && let Some(reason) = self
                .apply_relationships(entity_type, scope, dimensions, diff)
                .await
        {
            info!(entity_type = %entity_type, reason = %reason, "rejected submission");
            return Ok(SubmitOutcome::rejected(reason));
        }

        self.submissions
            .write()
            .await
            .entry(entity_type)
            .or_default()
            .push(payload);

        Ok(SubmitOutcome::accepted())
    }
}
