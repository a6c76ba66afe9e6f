//! Database models for accrual snapshots.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use custodian_core::custody::AccrualSnapshot;
use custodian_core::Error;

/// Database model for accrual snapshots.
///
/// Decimals are stored as text at full precision so a seeded replay sees the
/// exact balance that was settled.
#[derive(Queryable, Selectable, Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::custody_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CustodySnapshotDB {
    pub id: String,
    pub account_id: String,
    pub asset_id: String,
    pub cumulative_fee: String,
    pub control_timestamp: i64,
    pub running_balance: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<CustodySnapshotDB> for AccrualSnapshot {
    type Error = Error;

    fn try_from(db: CustodySnapshotDB) -> Result<Self, Self::Error> {
        Ok(AccrualSnapshot {
            cumulative_fee: Decimal::from_str(&db.cumulative_fee)?,
            running_balance: Decimal::from_str(&db.running_balance)?,
            id: db.id,
            account_id: db.account_id,
            asset_id: db.asset_id,
            control_timestamp: db.control_timestamp,
            created_at: db.created_at,
        })
    }
}

impl From<&AccrualSnapshot> for CustodySnapshotDB {
    fn from(domain: &AccrualSnapshot) -> Self {
        Self {
            id: domain.id.clone(),
            account_id: domain.account_id.clone(),
            asset_id: domain.asset_id.clone(),
            cumulative_fee: domain.cumulative_fee.to_string(),
            control_timestamp: domain.control_timestamp,
            running_balance: domain.running_balance.to_string(),
            created_at: domain.created_at,
        }
    }
}
