//! Database models for the ledger mirror.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use custodian_core::ledger::{LedgerAccount, Transfer};
use custodian_core::Error;

/// Database model for mirrored ledger accounts
#[derive(Queryable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccountDB {
    pub account_id: String,
    pub account_name: String,
    pub domain_id: String,
    pub created_at: NaiveDateTime,
}

/// Database model for recording a mirrored account
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_accounts)]
pub struct NewLedgerAccountDB {
    pub account_id: String,
    pub account_name: String,
    pub domain_id: String,
}

impl From<LedgerAccountDB> for LedgerAccount {
    fn from(db: LedgerAccountDB) -> Self {
        LedgerAccount::new(db.account_name, db.domain_id)
    }
}

impl From<&LedgerAccount> for NewLedgerAccountDB {
    fn from(domain: &LedgerAccount) -> Self {
        Self {
            account_id: domain.account_id(),
            account_name: domain.account_name.clone(),
            domain_id: domain.domain_id.clone(),
        }
    }
}

/// Database model for mirrored transfers.
///
/// `(block_height, tx_index, transfer_index)` is the ledger commit order.
#[derive(
    Queryable, Selectable, Insertable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::ledger_transfers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransferDB {
    pub id: String,
    pub block_height: i64,
    pub tx_index: i32,
    pub transfer_index: i32,
    pub src_account_id: String,
    pub dest_account_id: String,
    pub asset_id: String,
    pub amount: String,
    pub occurred_at: i64,
    pub rejected: bool,
}

impl TryFrom<LedgerTransferDB> for Transfer {
    type Error = Error;

    fn try_from(db: LedgerTransferDB) -> Result<Self, Self::Error> {
        Ok(Transfer {
            amount: Decimal::from_str(&db.amount)?,
            src_account_id: db.src_account_id,
            dest_account_id: db.dest_account_id,
            asset_id: db.asset_id,
            occurred_at: db.occurred_at,
            rejected: db.rejected,
        })
    }
}
