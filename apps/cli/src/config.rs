use anyhow::{Context, Result};
use custodian_core::CustodyConfig;
use std::str::FromStr;

pub struct Config {
    pub db_path: String,
    pub custody: CustodyConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a key lookup, falling back to defaults
    /// for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = CustodyConfig::default();
        let db_path = lookup("CUSTODIAN_DB_PATH").unwrap_or_else(|| "./db/custodian.db".into());

        let custody = CustodyConfig {
            custody_period_ms: parse_or(&lookup, "CUSTODY_PERIOD_MS", defaults.custody_period_ms)?,
            custody_billing_account_template: lookup("CUSTODY_BILLING_TEMPLATE")
                .unwrap_or(defaults.custody_billing_account_template),
            snapshot_staleness_multiplier: parse_or(
                &lookup,
                "CUSTODY_SNAPSHOT_STALENESS",
                defaults.snapshot_staleness_multiplier,
            )?,
            transfer_page_size: parse_or(
                &lookup,
                "CUSTODY_TRANSFER_PAGE_SIZE",
                defaults.transfer_page_size,
            )?,
            account_page_size: parse_or(
                &lookup,
                "CUSTODY_ACCOUNT_PAGE_SIZE",
                defaults.account_page_size,
            )?,
            max_concurrent_accounts: parse_or(
                &lookup,
                "CUSTODY_MAX_CONCURRENT_ACCOUNTS",
                defaults.max_concurrent_accounts,
            )?,
            snapshots_enabled: parse_or(
                &lookup,
                "CUSTODY_SNAPSHOTS_ENABLED",
                defaults.snapshots_enabled,
            )?,
        };
        custody.validate()?;

        Ok(Self { db_path, custody })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}
