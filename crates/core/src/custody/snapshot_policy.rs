//! When to seed from, and when to write, accrual snapshots.

use log::warn;

use super::custody_model::{AccrualSnapshot, AssetAccrualContext, AssetAccrualState};
use super::snapshot_traits::CustodySnapshotRepositoryTrait;
use super::CustodyWindow;
use rust_decimal::Decimal;

/// Checkpoint policy for one report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    enabled: bool,
    staleness_ms: i64,
}

impl SnapshotPolicy {
    pub fn new(enabled: bool, staleness_ms: i64) -> Self {
        Self {
            enabled,
            staleness_ms,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A snapshot is due when none is known or the newest one lags the
    /// settled context by more than the staleness threshold.
    pub fn should_write(&self, last_snapshot_at: Option<i64>, control_timestamp: i64) -> bool {
        if !self.enabled {
            return false;
        }
        match last_snapshot_at {
            None => true,
            Some(at) => control_timestamp.saturating_sub(at) > self.staleness_ms,
        }
    }

    /// Builds the initial replay state of an asset.
    ///
    /// With a snapshot at or before `window.from`, the balance is taken from
    /// it and transfers preceding its control timestamp are skipped. Fee and
    /// AUC start at zero because everything a snapshot at or before `from`
    /// accrued lies outside the window. A failed read falls back to a full
    /// replay.
    pub fn seed(
        &self,
        repository: &dyn CustodySnapshotRepositoryTrait,
        account_id: &str,
        asset_id: &str,
        window: &CustodyWindow,
        fee_fraction: Decimal,
    ) -> AssetAccrualState {
        let genesis = AssetAccrualState::new(AssetAccrualContext::new(window.from), fee_fraction);
        if !self.enabled {
            return genesis;
        }
        match repository.most_recent_at_or_before(account_id, asset_id, window.from) {
            Ok(Some(snapshot)) => seeded_state(&snapshot, window, fee_fraction),
            Ok(None) => genesis,
            Err(e) => {
                warn!(
                    "Snapshot lookup failed for {}/{}, replaying from genesis: {}",
                    account_id, asset_id, e
                );
                genesis
            }
        }
    }
}

fn seeded_state(
    snapshot: &AccrualSnapshot,
    window: &CustodyWindow,
    fee_fraction: Decimal,
) -> AssetAccrualState {
    AssetAccrualState {
        context: AssetAccrualContext::with_balance(window.from, snapshot.running_balance),
        fee_fraction,
        replay_from: Some(snapshot.control_timestamp),
        last_snapshot_at: Some(snapshot.control_timestamp),
    }
}
