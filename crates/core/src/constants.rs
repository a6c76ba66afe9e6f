/// One day in milliseconds, the default custody period.
pub const DEFAULT_CUSTODY_PERIOD_MS: i64 = 86_400_000;

/// Prefix of the per-domain custody billing account used as a rate lookup key.
pub const DEFAULT_CUSTODY_BILLING_TEMPLATE: &str = "custody_billing@";

/// A snapshot older than this many custody periods is considered stale.
pub const DEFAULT_SNAPSHOT_STALENESS_MULTIPLIER: i64 = 14;

/// Number of transfers fetched per mirror round-trip.
pub const DEFAULT_TRANSFER_PAGE_SIZE: u32 = 200;

/// Number of accounts per page for domain and system reports.
pub const DEFAULT_ACCOUNT_PAGE_SIZE: u32 = 20;

/// Accounts processed concurrently within one report.
pub const DEFAULT_MAX_CONCURRENT_ACCOUNTS: usize = 4;

/// Fractional digits kept when dividing elapsed time by a window or period.
pub const ACCRUAL_DIVISION_SCALE: u32 = 8;
