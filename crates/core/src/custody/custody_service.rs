use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, error, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use super::accrual::settle;
use super::custody_model::{
    AccountAccrualContext, AccountCustodyResult, AccrualSnapshot, AssetAccrualContext,
    AssetCustody, CustodyWindow,
};
use super::snapshot_policy::SnapshotPolicy;
use super::snapshot_traits::CustodySnapshotRepositoryTrait;
use crate::billing::{BillingRateRepositoryTrait, CustodyRateCache};
use crate::config::CustodyConfig;
use crate::errors::{CustodyError, Error, Result};
use crate::ledger::{LedgerAccount, LedgerMirrorRepositoryTrait, Page, PageRequest, Transfer};

#[async_trait]
pub trait CustodyServiceTrait: Send + Sync {
    /// Computes fee and assets under custody of every asset held by one
    /// `name@domain` account over `[from, to]`.
    ///
    /// Assets without a usable custody rate are omitted.
    async fn compute_account_custody(
        &self,
        account_id: &str,
        from: i64,
        to: i64,
    ) -> Result<BTreeMap<String, AssetCustody>>;

    /// Computes custody results for one page of a domain's accounts.
    async fn compute_domain_custody(
        &self,
        domain: &str,
        from: i64,
        to: i64,
        page: PageRequest,
    ) -> Result<Page<AccountCustodyResult>>;

    /// Computes custody results for one page of all ledger accounts.
    async fn compute_system_custody(
        &self,
        from: i64,
        to: i64,
        page: PageRequest,
    ) -> Result<Page<AccountCustodyResult>>;
}

/// Replays ledger transfers into per-asset fee and AUC accruals.
#[derive(Clone)]
pub struct CustodyService {
    ledger_repository: Arc<dyn LedgerMirrorRepositoryTrait>,
    billing_repository: Arc<dyn BillingRateRepositoryTrait>,
    snapshot_repository: Arc<dyn CustodySnapshotRepositoryTrait>,
    config: CustodyConfig,
}

impl CustodyService {
    pub fn new(
        ledger_repository: Arc<dyn LedgerMirrorRepositoryTrait>,
        billing_repository: Arc<dyn BillingRateRepositoryTrait>,
        snapshot_repository: Arc<dyn CustodySnapshotRepositoryTrait>,
        config: CustodyConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger_repository,
            billing_repository,
            snapshot_repository,
            config,
        })
    }

    pub fn config(&self) -> &CustodyConfig {
        &self.config
    }

    fn snapshot_policy(&self) -> SnapshotPolicy {
        SnapshotPolicy::new(
            self.config.snapshots_enabled,
            self.config.snapshot_staleness_ms(),
        )
    }

    async fn compute_accounts_page(
        &self,
        mut accounts: Page<LedgerAccount>,
        window: CustodyWindow,
    ) -> Result<Page<AccountCustodyResult>> {
        let started = Instant::now();
        let rates = CustodyRateCache::new();
        let window = &window;
        let rates = &rates;

        let results: Vec<AccountCustodyResult> =
            stream::iter(std::mem::take(&mut accounts.items))
                .map(|account| async move { self.process_account(&account, window, rates).await })
                .buffered(self.config.max_concurrent_accounts)
                .try_collect()
                .await?;

        debug!(
            "Custody computed for {} accounts (page {}/{}) in {:?}, {} rates resolved",
            results.len(),
            accounts.page_number,
            accounts.total_pages,
            started.elapsed(),
            rates.len()
        );
        Ok(accounts.with_items(results))
    }

    /// Walks every transfer page of one account and settles each asset to `window.to`.
    ///
    /// The result is only assembled once the whole walk succeeded.
    async fn process_account(
        &self,
        account: &LedgerAccount,
        window: &CustodyWindow,
        rates: &CustodyRateCache,
    ) -> Result<AccountCustodyResult> {
        let account_id = account.account_id();
        let scope_account_id = self.config.billing_scope_account(&account.domain_id);
        let mut context = AccountAccrualContext::new(account_id.clone());

        let mut page_number = 1;
        loop {
            let page = self
                .ledger_repository
                .list_transfers(
                    &account_id,
                    window.to,
                    PageRequest::new(page_number, self.config.transfer_page_size),
                )
                .map_err(mirror_error)?;
            debug!(
                "Replaying {} transfers of account {} (page {}/{})",
                page.items.len(),
                account_id,
                page_number,
                page.total_pages
            );

            for transfer in page
                .items
                .iter()
                .filter(|t| !t.rejected && t.occurred_at < window.to)
            {
                self.replay_transfer(&mut context, &scope_account_id, transfer, window, rates)
                    .await?;
            }

            if !page.has_next() {
                break;
            }
            page_number += 1;
        }

        self.finish_account(context, window).await
    }

    async fn replay_transfer(
        &self,
        context: &mut AccountAccrualContext,
        scope_account_id: &str,
        transfer: &Transfer,
        window: &CustodyWindow,
        rates: &CustodyRateCache,
    ) -> Result<()> {
        let asset_id = transfer.asset_id.as_str();
        if context.is_skipped(asset_id) {
            return Ok(());
        }
        if context.asset(asset_id).is_none() {
            match rates.resolve(self.billing_repository.as_ref(), scope_account_id, asset_id) {
                Ok(fee_fraction) => {
                    let state = self.snapshot_policy().seed(
                        self.snapshot_repository.as_ref(),
                        context.account_id(),
                        asset_id,
                        window,
                        fee_fraction,
                    );
                    context.insert_asset(asset_id, state);
                }
                Err(Error::Custody(e)) if e.is_asset_scoped() => {
                    omit_asset(context, asset_id, &e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        let (current, fee_fraction, last_snapshot_at) = match context.asset(asset_id) {
            Some(state) if !state.is_folded_into_seed(transfer.occurred_at) => {
                (state.context, state.fee_fraction, state.last_snapshot_at)
            }
            _ => return Ok(()),
        };

        let delta = transfer.delta_for(context.account_id());
        let step = settle(
            &current,
            window,
            transfer.occurred_at,
            fee_fraction,
            self.config.custody_period_ms,
        )
        .and_then(|settled| Ok((settled, settled.apply_delta(delta)?)));
        let (settled, applied) = match step {
            Ok(step) => step,
            Err(Error::Custody(e)) if e.is_asset_scoped() => {
                omit_asset(context, asset_id, &e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let advanced = settled.control_timestamp > current.control_timestamp;

        if let Some(state) = context.asset_mut(asset_id) {
            state.context = applied;
        }

        if advanced {
            let account_id = context.account_id().to_string();
            if let Some(written_at) = self
                .checkpoint(&account_id, asset_id, &settled, last_snapshot_at)
                .await
            {
                if let Some(state) = context.asset_mut(asset_id) {
                    state.last_snapshot_at = Some(written_at);
                }
            }
        }
        Ok(())
    }

    /// Settles every remaining asset to the end of the window.
    ///
    /// Asset-scoped failures omit the asset, anything else fails the account.
    pub(super) async fn finish_account(
        &self,
        context: AccountAccrualContext,
        window: &CustodyWindow,
    ) -> Result<AccountCustodyResult> {
        let account_id = context.account_id().to_string();
        let skipped: Vec<&str> = context.skipped_assets().collect();
        if !skipped.is_empty() {
            debug!("Account {} omits assets {:?}", account_id, skipped);
        }
        let mut asset_custody = BTreeMap::new();

        for (asset_id, state) in context.into_assets() {
            let settled = match settle(
                &state.context,
                window,
                window.to,
                state.fee_fraction,
                self.config.custody_period_ms,
            ) {
                Ok(settled) => settled,
                Err(Error::Custody(e)) if e.is_asset_scoped() => {
                    warn!(
                        "Omitting asset {} for account {}: {}",
                        asset_id, account_id, e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.checkpoint(&account_id, &asset_id, &settled, state.last_snapshot_at)
                .await;
            asset_custody.insert(asset_id, settled.to_custody());
        }

        Ok(AccountCustodyResult {
            account_id,
            asset_custody,
        })
    }

    /// Appends a snapshot of `settled` when the policy asks for one.
    ///
    /// Returns the control timestamp of the written snapshot. Write failures
    /// are logged and otherwise ignored.
    ///
    /// Only the snapshot found at or before `from` is known to the policy, so
    /// re-running a window appends the same checkpoints again. Rows are never
    /// pruned.
    // TODO: add a retention pass that drops duplicate (account, asset, ctl) rows.
    async fn checkpoint(
        &self,
        account_id: &str,
        asset_id: &str,
        settled: &AssetAccrualContext,
        last_snapshot_at: Option<i64>,
    ) -> Option<i64> {
        if !self
            .snapshot_policy()
            .should_write(last_snapshot_at, settled.control_timestamp)
        {
            return None;
        }
        let snapshot = AccrualSnapshot::from_context(account_id, asset_id, settled);
        match self.snapshot_repository.append(&snapshot).await {
            Ok(()) => {
                debug!(
                    "Saved accrual snapshot {} for {}/{} at {}",
                    snapshot.id, account_id, asset_id, snapshot.control_timestamp
                );
                Some(snapshot.control_timestamp)
            }
            Err(e) => {
                error!(
                    "{} ({}/{} at {})",
                    CustodyError::SnapshotWriteFailure(e.to_string()),
                    account_id,
                    asset_id,
                    snapshot.control_timestamp
                );
                None
            }
        }
    }
}

fn omit_asset(context: &mut AccountAccrualContext, asset_id: &str, err: &CustodyError) {
    warn!(
        "Omitting asset {} for account {}: {}",
        asset_id,
        context.account_id(),
        err
    );
    context.skip_asset(asset_id);
}

/// Storage failures while reading the mirror make the whole report retryable.
fn mirror_error(err: Error) -> Error {
    match err {
        Error::Database(db) => CustodyError::MirrorUnavailable(db.to_string()).into(),
        other => other,
    }
}

#[async_trait]
impl CustodyServiceTrait for CustodyService {
    async fn compute_account_custody(
        &self,
        account_id: &str,
        from: i64,
        to: i64,
    ) -> Result<BTreeMap<String, AssetCustody>> {
        let window = CustodyWindow::new(from, to)?;
        let account = LedgerAccount::parse(account_id)?;
        let rates = CustodyRateCache::new();

        let result = self.process_account(&account, &window, &rates).await?;
        Ok(result.asset_custody)
    }

    async fn compute_domain_custody(
        &self,
        domain: &str,
        from: i64,
        to: i64,
        page: PageRequest,
    ) -> Result<Page<AccountCustodyResult>> {
        let window = CustodyWindow::new(from, to)?;
        page.validate()?;
        let accounts = self
            .ledger_repository
            .list_accounts(Some(domain), page)
            .map_err(mirror_error)?;
        self.compute_accounts_page(accounts, window).await
    }

    async fn compute_system_custody(
        &self,
        from: i64,
        to: i64,
        page: PageRequest,
    ) -> Result<Page<AccountCustodyResult>> {
        let window = CustodyWindow::new(from, to)?;
        page.validate()?;
        let accounts = self
            .ledger_repository
            .list_accounts(None, page)
            .map_err(mirror_error)?;
        self.compute_accounts_page(accounts, window).await
    }
}
