//! Per-report memo of custody fee rates.

use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::billing_traits::BillingRateRepositoryTrait;
use crate::custody::validate_fee_fraction;
use crate::errors::{CustodyError, Result};

/// Memo of successful custody rate lookups for one report run.
///
/// Created at the start of a report and dropped with it; accounts of the run
/// share it. Entries are keyed by (scope account, asset), so a single-domain
/// run hits the directory at most once per asset. Misses are not memoized.
#[derive(Debug, Default)]
pub struct CustodyRateCache {
    rates: Mutex<HashMap<(String, String), Decimal>>,
}

impl CustodyRateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the custody fee fraction for an asset within a billing scope.
    ///
    /// Fails with `BillingNotFound` when the directory has no rate and with
    /// `InvalidFeeFraction` when the configured rate lies outside (0, 1].
    /// Directory I/O errors are returned unchanged.
    pub fn resolve(
        &self,
        repository: &dyn BillingRateRepositoryTrait,
        scope_account_id: &str,
        asset_id: &str,
    ) -> Result<Decimal> {
        // Held across the directory lookup.
        let mut rates = self.rates.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (scope_account_id.to_string(), asset_id.to_string());
        if let Some(rate) = rates.get(&key) {
            return Ok(*rate);
        }

        let Some(fee_fraction) = repository.find_custody_rate(scope_account_id, asset_id)? else {
            warn!(
                "No custody rate for asset {} in billing scope {}",
                asset_id, scope_account_id
            );
            return Err(CustodyError::BillingNotFound {
                scope_account_id: scope_account_id.to_string(),
                asset_id: asset_id.to_string(),
            }
            .into());
        };
        validate_fee_fraction(fee_fraction)?;

        debug!(
            "Resolved custody rate {} for asset {} in scope {}",
            fee_fraction, asset_id, scope_account_id
        );
        rates.insert(key, fee_fraction);
        Ok(fee_fraction)
    }

    pub fn len(&self) -> usize {
        self.rates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{BillingRate, BillingType};
    use crate::errors::Error;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDirectory {
        rates: HashMap<(String, String), Decimal>,
        calls: AtomicUsize,
    }

    impl CountingDirectory {
        fn new(entries: &[(&str, &str, Decimal)]) -> Self {
            Self {
                rates: entries
                    .iter()
                    .map(|(scope, asset, rate)| ((scope.to_string(), asset.to_string()), *rate))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl BillingRateRepositoryTrait for CountingDirectory {
        fn find_rate(
            &self,
            scope_account_id: &str,
            asset_id: &str,
            billing_type: BillingType,
        ) -> Result<Option<BillingRate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rates
                .get(&(scope_account_id.to_string(), asset_id.to_string()))
                .map(|fee_fraction| BillingRate {
                    scope_account_id: scope_account_id.to_string(),
                    asset_id: asset_id.to_string(),
                    billing_type,
                    fee_fraction: *fee_fraction,
                    created: 0,
                    updated: 0,
                }))
        }
    }

    #[test]
    fn test_successful_lookup_is_memoized() {
        let directory = CountingDirectory::new(&[("custody_billing@bank", "usd#bank", dec!(0.1))]);
        let cache = CustodyRateCache::new();

        for _ in 0..3 {
            let rate = cache
                .resolve(&directory, "custody_billing@bank", "usd#bank")
                .unwrap();
            assert_eq!(rate, dec!(0.1));
        }
        assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_rate_is_billing_not_found_and_not_memoized() {
        let directory = CountingDirectory::new(&[]);
        let cache = CustodyRateCache::new();

        for _ in 0..2 {
            let err = cache
                .resolve(&directory, "custody_billing@bank", "eur#bank")
                .unwrap_err();
            assert!(matches!(
                err,
                Error::Custody(CustodyError::BillingNotFound { .. })
            ));
        }
        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_out_of_range_rate_is_rejected() {
        let directory = CountingDirectory::new(&[("custody_billing@bank", "usd#bank", dec!(1.2))]);
        let cache = CustodyRateCache::new();

        let err = cache
            .resolve(&directory, "custody_billing@bank", "usd#bank")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Custody(CustodyError::InvalidFeeFraction(_))
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_scopes_are_cached_separately() {
        let directory = CountingDirectory::new(&[
            ("custody_billing@bank", "usd#bank", dec!(0.1)),
            ("custody_billing@fund", "usd#bank", dec!(0.2)),
        ]);
        let cache = CustodyRateCache::new();

        assert_eq!(
            cache
                .resolve(&directory, "custody_billing@bank", "usd#bank")
                .unwrap(),
            dec!(0.1)
        );
        assert_eq!(
            cache
                .resolve(&directory, "custody_billing@fund", "usd#bank")
                .unwrap(),
            dec!(0.2)
        );
        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
    }
}
