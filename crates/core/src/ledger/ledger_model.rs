//! Ledger mirror domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// An account created on the ledger, as mirrored by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccount {
    pub account_name: String,
    pub domain_id: String,
}

impl LedgerAccount {
    pub fn new(account_name: impl Into<String>, domain_id: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            domain_id: domain_id.into(),
        }
    }

    /// Parses a full `name@domain` account id.
    pub fn parse(account_id: &str) -> Result<Self> {
        match account_id.split_once('@') {
            Some((name, domain)) if !name.is_empty() && !domain.is_empty() => {
                Ok(Self::new(name, domain))
            }
            _ => Err(ValidationError::InvalidInput(format!(
                "account id '{}' is not of the form name@domain",
                account_id
            ))
            .into()),
        }
    }

    /// Full ledger id, `name@domain`.
    pub fn account_id(&self) -> String {
        format!("{}@{}", self.account_name, self.domain_id)
    }
}

/// A balance-changing transfer committed in a ledger block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub src_account_id: String,
    pub dest_account_id: String,
    pub asset_id: String,
    pub amount: Decimal,
    /// Block creation time in milliseconds.
    pub occurred_at: i64,
    pub rejected: bool,
}

impl Transfer {
    /// Signed effect of this transfer on `account_id`'s balance.
    ///
    /// A transfer from an account to itself nets to zero.
    pub fn delta_for(&self, account_id: &str) -> Decimal {
        let mut delta = Decimal::ZERO;
        if self.dest_account_id == account_id {
            delta += self.amount;
        }
        if self.src_account_id == account_id {
            delta -= self.amount;
        }
        delta
    }
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_number == 0 {
            return Err(ValidationError::InvalidInput(
                "page numbers start at 1".to_string(),
            )
            .into());
        }
        if self.page_size == 0 {
            return Err(
                ValidationError::InvalidInput("page size must be positive".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Number of rows preceding this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page_number.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// One page of results plus the totals needed to walk the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.page_size.max(1));
        let total_pages = u32::try_from(total_elements.div_ceil(size)).unwrap_or(u32::MAX);
        Self {
            items,
            page_number: request.page_number,
            page_size: request.page_size,
            total_elements,
            total_pages,
        }
    }

    /// Whether pages beyond this one exist.
    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page {
            items,
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn transfer(src: &str, dest: &str, amount: Decimal) -> Transfer {
        Transfer {
            src_account_id: src.to_string(),
            dest_account_id: dest.to_string(),
            asset_id: "usd#bank".to_string(),
            amount,
            occurred_at: 0,
            rejected: false,
        }
    }

    #[test]
    fn test_delta_for_direction() {
        let t = transfer("alice@bank", "bob@bank", dec!(5));
        assert_eq!(t.delta_for("bob@bank"), dec!(5));
        assert_eq!(t.delta_for("alice@bank"), dec!(-5));
        assert_eq!(t.delta_for("carol@bank"), Decimal::ZERO);
    }

    #[test]
    fn test_self_transfer_nets_to_zero() {
        let t = transfer("alice@bank", "alice@bank", dec!(7));
        assert_eq!(t.delta_for("alice@bank"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_account_id() {
        let account = LedgerAccount::parse("alice@bank").unwrap();
        assert_eq!(account.account_name, "alice");
        assert_eq!(account.domain_id, "bank");
        assert_eq!(account.account_id(), "alice@bank");

        assert!(LedgerAccount::parse("alice").is_err());
        assert!(LedgerAccount::parse("@bank").is_err());
    }

    #[test]
    fn test_page_totals() {
        let page = Page::new(vec![1, 2], PageRequest::new(1, 2), 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());

        let last = Page::new(vec![5], PageRequest::new(3, 2), 5);
        assert!(!last.has_next());

        let empty: Page<i32> = Page::new(vec![], PageRequest::new(1, 10), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_page_request_offset_and_validation() {
        assert_eq!(PageRequest::new(3, 200).offset(), 400);
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert!(PageRequest::new(1, 10).validate().is_ok());
    }
}
