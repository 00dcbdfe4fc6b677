use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use terrasense_core::{AppError, AppResult};
use terrasense_domain::RelationshipRow;

/// Content hash of the existing rows a diff was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotFingerprint(String);

impl SnapshotFingerprint {
    /// Hashes the keys and canonical statuses of `rows`, independent of their order.
    pub fn of(rows: &[RelationshipRow]) -> AppResult<Self> {
        let mut entries: Vec<(&[i64], i64)> = rows
            .iter()
            .map(|row| (row.key().ids(), row.status().status_id()))
            .collect();
        entries.sort_unstable();

        let encoded = serde_json::to_vec(&entries).map_err(|error| {
            AppError::Internal(format!("failed to encode snapshot fingerprint input: {error}"))
        })?;

        let digest = Sha256::digest(encoded);
        Ok(Self(
            digest.iter().map(|byte| format!("{byte:02x}")).collect(),
        ))
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SnapshotFingerprint {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use terrasense_domain::{AuditFields, RelationshipKey, RelationshipRow, RowStatus};

    use super::SnapshotFingerprint;

    fn row(ids: &[i64], status: RowStatus) -> RelationshipRow {
        RelationshipRow::new(RelationshipKey::new(ids.to_vec()), status, AuditFields::default())
    }

    #[test]
    fn fingerprint_ignores_row_order_but_not_status() {
        let forward = SnapshotFingerprint::of(&[
            row(&[1, 10], RowStatus::Active),
            row(&[2, 10], RowStatus::Inactive),
        ])
        .unwrap_or_else(|_| unreachable!());
        let reversed = SnapshotFingerprint::of(&[
            row(&[2, 10], RowStatus::Inactive),
            row(&[1, 10], RowStatus::Active),
        ])
        .unwrap_or_else(|_| unreachable!());
        let flipped = SnapshotFingerprint::of(&[
            row(&[1, 10], RowStatus::Active),
            row(&[2, 10], RowStatus::Active),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(forward, reversed);
        assert_ne!(forward, flipped);
        assert_eq!(forward.as_str().len(), 64);
    }

    #[test]
    fn legacy_inactive_rows_hash_like_canonical_ones() {
        let legacy = RowStatus::from_status_id(2).unwrap_or_else(|_| unreachable!());

        let from_legacy = SnapshotFingerprint::of(&[row(&[2, 10], legacy)])
            .unwrap_or_else(|_| unreachable!());
        let from_canonical = SnapshotFingerprint::of(&[row(&[2, 10], RowStatus::Inactive)])
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(from_legacy, from_canonical);
    }
}
