//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACCOUNT_PAGE_SIZE, DEFAULT_CUSTODY_BILLING_TEMPLATE, DEFAULT_CUSTODY_PERIOD_MS,
    DEFAULT_MAX_CONCURRENT_ACCOUNTS, DEFAULT_SNAPSHOT_STALENESS_MULTIPLIER,
    DEFAULT_TRANSFER_PAGE_SIZE,
};
use crate::errors::{Error, Result};

/// Settings consumed by the custody accrual engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustodyConfig {
    /// Base duration (ms) over which a fee fraction is charged.
    pub custody_period_ms: i64,
    /// Prefix joined with a domain to form the billing scope account id.
    pub custody_billing_account_template: String,
    /// Snapshots lagging by more than this many custody periods are refreshed.
    pub snapshot_staleness_multiplier: i64,
    pub transfer_page_size: u32,
    pub account_page_size: u32,
    pub max_concurrent_accounts: usize,
    /// Seed contexts from persisted snapshots and write new ones.
    pub snapshots_enabled: bool,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            custody_period_ms: DEFAULT_CUSTODY_PERIOD_MS,
            custody_billing_account_template: DEFAULT_CUSTODY_BILLING_TEMPLATE.to_string(),
            snapshot_staleness_multiplier: DEFAULT_SNAPSHOT_STALENESS_MULTIPLIER,
            transfer_page_size: DEFAULT_TRANSFER_PAGE_SIZE,
            account_page_size: DEFAULT_ACCOUNT_PAGE_SIZE,
            max_concurrent_accounts: DEFAULT_MAX_CONCURRENT_ACCOUNTS,
            snapshots_enabled: true,
        }
    }
}

impl CustodyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.custody_period_ms <= 0 {
            return Err(Error::InvalidConfigValue(format!(
                "custody period must be positive, got {}",
                self.custody_period_ms
            )));
        }
        if self.snapshot_staleness_multiplier < 0 {
            return Err(Error::InvalidConfigValue(format!(
                "snapshot staleness multiplier must not be negative, got {}",
                self.snapshot_staleness_multiplier
            )));
        }
        if self.transfer_page_size == 0 || self.account_page_size == 0 {
            return Err(Error::InvalidConfigValue(
                "page sizes must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_accounts == 0 {
            return Err(Error::InvalidConfigValue(
                "max concurrent accounts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Billing scope account for a domain, e.g. `custody_billing@` + `bank`.
    pub fn billing_scope_account(&self, domain: &str) -> String {
        format!("{}{}", self.custody_billing_account_template, domain)
    }

    /// Maximum lag, in ms, tolerated between a snapshot and the live context.
    pub fn snapshot_staleness_ms(&self) -> i64 {
        self.custody_period_ms
            .saturating_mul(self.snapshot_staleness_multiplier)
    }
}
