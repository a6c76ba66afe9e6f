//! Read contract of the ledger mirror.
//!
//! The mirror is populated by an upstream ingestion pipeline; the custody
//! engine only reads from it.

use super::ledger_model::{LedgerAccount, Page, PageRequest, Transfer};
use crate::errors::Result;

/// Trait defining the contract for ledger mirror queries.
pub trait LedgerMirrorRepositoryTrait: Send + Sync {
    /// Lists non-rejected transfers touching `account_id` (as source or
    /// destination) committed strictly before `to`, in block and transaction
    /// order.
    fn list_transfers(
        &self,
        account_id: &str,
        to: i64,
        page: PageRequest,
    ) -> Result<Page<Transfer>>;

    /// Lists accounts of one domain, or of the whole ledger when `domain` is `None`.
    fn list_accounts(&self, domain: Option<&str>, page: PageRequest)
        -> Result<Page<LedgerAccount>>;
}
