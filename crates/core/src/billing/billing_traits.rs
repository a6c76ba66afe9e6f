//! Read contract of the billing rate directory.

use rust_decimal::Decimal;

use super::billing_model::{BillingRate, BillingType};
use crate::errors::Result;

/// Trait defining the contract for billing rate lookups.
pub trait BillingRateRepositoryTrait: Send + Sync {
    /// Finds the rate of `billing_type` configured for a scope account and asset.
    fn find_rate(
        &self,
        scope_account_id: &str,
        asset_id: &str,
        billing_type: BillingType,
    ) -> Result<Option<BillingRate>>;

    /// Fee fraction of the custody rate, if one is configured.
    fn find_custody_rate(&self, scope_account_id: &str, asset_id: &str) -> Result<Option<Decimal>> {
        Ok(self
            .find_rate(scope_account_id, asset_id, BillingType::Custody)?
            .map(|rate| rate.fee_fraction))
    }
}
