//! Repository trait for accrual snapshots.

use async_trait::async_trait;

use super::custody_model::AccrualSnapshot;
use crate::errors::Result;

/// Append-only store of accrual snapshots keyed by (account, asset, control timestamp).
#[async_trait]
pub trait CustodySnapshotRepositoryTrait: Send + Sync {
    /// Latest snapshot of the pair whose control timestamp is at or before `timestamp`.
    fn most_recent_at_or_before(
        &self,
        account_id: &str,
        asset_id: &str,
        timestamp: i64,
    ) -> Result<Option<AccrualSnapshot>>;

    /// Inserts a snapshot. Existing rows are never updated.
    async fn append(&self, snapshot: &AccrualSnapshot) -> Result<()>;
}
