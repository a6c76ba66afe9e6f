//! Billing rate domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, ValidationError};

/// Kind of fee a billing rate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingType {
    Transfer,
    Custody,
    AccountCreation,
    Exchange,
    Withdrawal,
}

impl BillingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingType::Transfer => "TRANSFER",
            BillingType::Custody => "CUSTODY",
            BillingType::AccountCreation => "ACCOUNT_CREATION",
            BillingType::Exchange => "EXCHANGE",
            BillingType::Withdrawal => "WITHDRAWAL",
        }
    }
}

impl fmt::Display for BillingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRANSFER" => Ok(BillingType::Transfer),
            "CUSTODY" => Ok(BillingType::Custody),
            "ACCOUNT_CREATION" => Ok(BillingType::AccountCreation),
            "EXCHANGE" => Ok(BillingType::Exchange),
            "WITHDRAWAL" => Ok(BillingType::Withdrawal),
            other => Err(ValidationError::InvalidInput(format!(
                "unknown billing type '{}'",
                other
            ))
            .into()),
        }
    }
}

/// A fee rate configured for a billing scope account and asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRate {
    pub scope_account_id: String,
    pub asset_id: String,
    pub billing_type: BillingType,
    pub fee_fraction: Decimal,
    /// Creation and last update time in milliseconds.
    pub created: i64,
    pub updated: i64,
}
