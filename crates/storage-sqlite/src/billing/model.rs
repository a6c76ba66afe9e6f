//! Database models for billing rates.

use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use custodian_core::billing::{BillingRate, BillingType};
use custodian_core::Error;

/// Database model for billing rates
#[derive(
    Queryable, Selectable, Insertable, AsChangeset, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::billing_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct BillingRateDB {
    pub scope_account_id: String,
    pub asset_id: String,
    pub billing_type: String,
    pub fee_fraction: String,
    pub created: i64,
    pub updated: i64,
}

impl TryFrom<BillingRateDB> for BillingRate {
    type Error = Error;

    fn try_from(db: BillingRateDB) -> Result<Self, Self::Error> {
        Ok(BillingRate {
            billing_type: BillingType::from_str(&db.billing_type)?,
            fee_fraction: Decimal::from_str(&db.fee_fraction)?,
            scope_account_id: db.scope_account_id,
            asset_id: db.asset_id,
            created: db.created,
            updated: db.updated,
        })
    }
}

impl From<BillingRate> for BillingRateDB {
    fn from(domain: BillingRate) -> Self {
        Self {
            scope_account_id: domain.scope_account_id,
            asset_id: domain.asset_id,
            billing_type: domain.billing_type.as_str().to_string(),
            fee_fraction: domain.fee_fraction.to_string(),
            created: domain.created,
            updated: domain.updated,
        }
    }
}
