//! JSON envelopes printed by the CLI.

use std::collections::BTreeMap;

use custodian_core::ledger::Page;
use custodian_core::{AccountCustodyResult, AssetCustody, Error};
use serde::Serialize;

/// Successful report output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyReport {
    pub accounts: Vec<AccountCustodyResult>,
    /// Number of accounts in scope, across all pages.
    pub total: u64,
    pub pages: u32,
}

impl CustodyReport {
    pub fn for_account(account_id: &str, asset_custody: BTreeMap<String, AssetCustody>) -> Self {
        Self {
            accounts: vec![AccountCustodyResult {
                account_id: account_id.to_string(),
                asset_custody,
            }],
            total: 1,
            pages: 1,
        }
    }

    pub fn from_pages(pages: Vec<Page<AccountCustodyResult>>) -> Self {
        let total = pages.last().map_or(0, |p| p.total_elements);
        let page_count = pages.last().map_or(0, |p| p.total_pages);
        Self {
            accounts: pages.into_iter().flat_map(|p| p.items).collect(),
            total,
            pages: page_count,
        }
    }
}

/// Failure output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&Error> for ErrorEnvelope {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<&anyhow::Error> for ErrorEnvelope {
    fn from(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<Error>() {
            Some(core) => core.into(),
            None => Self {
                code: "UnexpectedError".to_string(),
                message: format!("{:#}", err),
                retryable: false,
            },
        }
    }
}
