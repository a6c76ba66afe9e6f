//! Custody accrual domain models.

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{CustodyError, Result};

/// Report window `[from, to]` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyWindow {
    pub from: i64,
    pub to: i64,
}

impl CustodyWindow {
    /// Fails unless `from < to` and the length fits an `i64`.
    pub fn new(from: i64, to: i64) -> Result<Self> {
        match to.checked_sub(from) {
            Some(length) if length > 0 => Ok(Self { from, to }),
            _ => Err(CustodyError::InvalidWindow { from, to }.into()),
        }
    }

    pub fn length(&self) -> Result<i64> {
        match self.to.checked_sub(self.from) {
            Some(length) if length > 0 => Ok(length),
            _ => Err(CustodyError::InvalidWindow {
                from: self.from,
                to: self.to,
            }
            .into()),
        }
    }
}

/// Running accrual state of one asset held by one account.
///
/// The accrual primitives take a context and return the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAccrualContext {
    pub cumulative_fee: Decimal,
    pub cumulative_auc: Decimal,
    /// Last instant up to which fee and AUC have been settled.
    pub control_timestamp: i64,
    pub running_balance: Decimal,
}

impl AssetAccrualContext {
    /// Fresh context with nothing accrued and a zero balance.
    pub fn new(control_timestamp: i64) -> Self {
        Self::with_balance(control_timestamp, Decimal::ZERO)
    }

    /// Context carrying a balance established before `control_timestamp`.
    pub fn with_balance(control_timestamp: i64, running_balance: Decimal) -> Self {
        Self {
            cumulative_fee: Decimal::ZERO,
            cumulative_auc: Decimal::ZERO,
            control_timestamp,
            running_balance,
        }
    }

    pub fn apply_delta(self, delta: Decimal) -> Result<Self> {
        let running_balance = self
            .running_balance
            .checked_add(delta)
            .ok_or_else(|| CustodyError::AccrualOverflow("running balance".to_string()))?;
        Ok(Self {
            running_balance,
            ..self
        })
    }

    pub fn advance_to(self, control_timestamp: i64) -> Self {
        Self {
            control_timestamp,
            ..self
        }
    }

    pub fn to_custody(&self) -> AssetCustody {
        AssetCustody {
            fee: self.cumulative_fee,
            assets_under_custody: self.cumulative_auc,
        }
    }
}

/// Per-asset replay bookkeeping around an [`AssetAccrualContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetAccrualState {
    pub context: AssetAccrualContext,
    pub fee_fraction: Decimal,
    /// Transfers stamped before this instant are already folded into the
    /// seeded balance and must not be replayed.
    pub replay_from: Option<i64>,
    /// Control timestamp of the newest snapshot known for this pair.
    pub last_snapshot_at: Option<i64>,
}

impl AssetAccrualState {
    pub fn new(context: AssetAccrualContext, fee_fraction: Decimal) -> Self {
        Self {
            context,
            fee_fraction,
            replay_from: None,
            last_snapshot_at: None,
        }
    }

    pub fn is_folded_into_seed(&self, occurred_at: i64) -> bool {
        self.replay_from.is_some_and(|seed| occurred_at < seed)
    }
}

/// All asset contexts of one account for one report run.
#[derive(Debug, Clone, Default)]
pub struct AccountAccrualContext {
    account_id: String,
    assets: BTreeMap<String, AssetAccrualState>,
    skipped: BTreeSet<String>,
}

impl AccountAccrualContext {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Self::default()
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn asset(&self, asset_id: &str) -> Option<&AssetAccrualState> {
        self.assets.get(asset_id)
    }

    pub fn asset_mut(&mut self, asset_id: &str) -> Option<&mut AssetAccrualState> {
        self.assets.get_mut(asset_id)
    }

    pub fn insert_asset(&mut self, asset_id: impl Into<String>, state: AssetAccrualState) {
        self.assets.insert(asset_id.into(), state);
    }

    /// Excludes an asset from the rest of this run and from the result.
    pub fn skip_asset(&mut self, asset_id: &str) {
        self.assets.remove(asset_id);
        self.skipped.insert(asset_id.to_string());
    }

    pub fn is_skipped(&self, asset_id: &str) -> bool {
        self.skipped.contains(asset_id)
    }

    pub fn skipped_assets(&self) -> impl Iterator<Item = &str> {
        self.skipped.iter().map(String::as_str)
    }

    pub fn into_assets(self) -> BTreeMap<String, AssetAccrualState> {
        self.assets
    }
}

/// Persisted point-in-time copy of an asset context.
///
/// The values are those settled at `control_timestamp`, before any transfer
/// stamped exactly at `control_timestamp` was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccrualSnapshot {
    pub id: String,
    pub account_id: String,
    pub asset_id: String,
    pub cumulative_fee: Decimal,
    pub control_timestamp: i64,
    pub running_balance: Decimal,
    pub created_at: NaiveDateTime,
}

impl AccrualSnapshot {
    pub fn from_context(account_id: &str, asset_id: &str, context: &AssetAccrualContext) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            asset_id: asset_id.to_string(),
            cumulative_fee: context.cumulative_fee,
            control_timestamp: context.control_timestamp,
            running_balance: context.running_balance,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// Fee and assets under custody of one asset over a report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCustody {
    pub fee: Decimal,
    pub assets_under_custody: Decimal,
}

/// Custody results of one account, keyed by asset id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCustodyResult {
    pub account_id: String,
    pub asset_custody: BTreeMap<String, AssetCustody>,
}
