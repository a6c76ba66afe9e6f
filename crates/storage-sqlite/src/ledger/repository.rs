use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::Sqlite;
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::{LedgerAccountDB, LedgerTransferDB, NewLedgerAccountDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{ledger_accounts, ledger_transfers};
use custodian_core::errors::Result;
use custodian_core::ledger::{
    LedgerAccount, LedgerMirrorRepositoryTrait, Page, PageRequest, Transfer,
};

/// A transfer together with its position in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedTransfer {
    pub block_height: i64,
    pub tx_index: i32,
    pub transfer_index: i32,
    pub transfer: Transfer,
}

impl From<RecordedTransfer> for LedgerTransferDB {
    fn from(recorded: RecordedTransfer) -> Self {
        let RecordedTransfer {
            block_height,
            tx_index,
            transfer_index,
            transfer,
        } = recorded;
        Self {
            id: format!("{}:{}:{}", block_height, tx_index, transfer_index),
            block_height,
            tx_index,
            transfer_index,
            src_account_id: transfer.src_account_id,
            dest_account_id: transfer.dest_account_id,
            asset_id: transfer.asset_id,
            amount: transfer.amount.to_string(),
            occurred_at: transfer.occurred_at,
            rejected: transfer.rejected,
        }
    }
}

/// Read side of the ledger mirror, plus the ingestion writes that fill it.
pub struct LedgerMirrorRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl LedgerMirrorRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn transfers_query<'a>(
        account_id: &'a str,
        to: i64,
    ) -> ledger_transfers::BoxedQuery<'a, Sqlite> {
        ledger_transfers::table
            .filter(
                ledger_transfers::src_account_id
                    .eq(account_id)
                    .or(ledger_transfers::dest_account_id.eq(account_id)),
            )
            .filter(ledger_transfers::occurred_at.lt(to))
            .filter(ledger_transfers::rejected.eq(false))
            .into_boxed()
    }

    fn accounts_query(domain: Option<&str>) -> ledger_accounts::BoxedQuery<'_, Sqlite> {
        let mut query = ledger_accounts::table.into_boxed();
        if let Some(domain_id) = domain {
            query = query.filter(ledger_accounts::domain_id.eq(domain_id));
        }
        query
    }

    /// Records mirrored accounts. Accounts already present are left untouched.
    pub async fn record_accounts(&self, accounts: Vec<LedgerAccount>) -> Result<usize> {
        let rows: Vec<NewLedgerAccountDB> = accounts.iter().map(NewLedgerAccountDB::from).collect();
        debug!("Recording {} ledger accounts", rows.len());
        self.writer
            .exec(move |conn| {
                Ok(diesel::insert_or_ignore_into(ledger_accounts::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    /// Records mirrored transfers. Transfers already present are left untouched.
    pub async fn record_transfers(&self, transfers: Vec<RecordedTransfer>) -> Result<usize> {
        let rows: Vec<LedgerTransferDB> = transfers.into_iter().map(LedgerTransferDB::from).collect();
        debug!("Recording {} ledger transfers", rows.len());
        self.writer
            .exec(move |conn| {
                Ok(diesel::insert_or_ignore_into(ledger_transfers::table)
                    .values(&rows)
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

impl LedgerMirrorRepositoryTrait for LedgerMirrorRepository {
    fn list_transfers(
        &self,
        account_id: &str,
        to: i64,
        page: PageRequest,
    ) -> Result<Page<Transfer>> {
        page.validate()?;
        let mut conn = get_connection(&self.pool)?;

        let total = Self::transfers_query(account_id, to)
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        let rows = Self::transfers_query(account_id, to)
            .order((
                ledger_transfers::block_height.asc(),
                ledger_transfers::tx_index.asc(),
                ledger_transfers::transfer_index.asc(),
            ))
            .limit(i64::from(page.page_size))
            .offset(page.offset())
            .load::<LedgerTransferDB>(&mut conn)
            .map_err(StorageError::from)?;

        let transfers = rows
            .into_iter()
            .map(Transfer::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(transfers, page, total.max(0) as u64))
    }

    fn list_accounts(
        &self,
        domain: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<LedgerAccount>> {
        page.validate()?;
        let mut conn = get_connection(&self.pool)?;

        let total = Self::accounts_query(domain)
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        let rows = Self::accounts_query(domain)
            .order(ledger_accounts::account_id.asc())
            .limit(i64::from(page.page_size))
            .offset(page.offset())
            .load::<LedgerAccountDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok(Page::new(
            rows.into_iter().map(LedgerAccount::from).collect(),
            page,
            total.max(0) as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn create_test_repository() -> (LedgerMirrorRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let pool = create_pool(&db_path.to_string_lossy()).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (LedgerMirrorRepository::new(pool, writer), temp_dir)
    }

    fn recorded(
        block_height: i64,
        tx_index: i32,
        src: &str,
        dest: &str,
        amount: rust_decimal::Decimal,
        occurred_at: i64,
        rejected: bool,
    ) -> RecordedTransfer {
        RecordedTransfer {
            block_height,
            tx_index,
            transfer_index: 0,
            transfer: Transfer {
                src_account_id: src.to_string(),
                dest_account_id: dest.to_string(),
                asset_id: "usd#bank".to_string(),
                amount,
                occurred_at,
                rejected,
            },
        }
    }

    #[tokio::test]
    async fn test_list_transfers_in_commit_order_before_cutoff() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.record_transfers(vec![
            recorded(3, 0, "treasury@bank", "alice@bank", dec!(3), 300, false),
            recorded(1, 1, "treasury@bank", "alice@bank", dec!(1.5), 100, false),
            recorded(1, 0, "alice@bank", "bob@bank", dec!(0.25), 100, false),
            recorded(2, 0, "treasury@bank", "alice@bank", dec!(99), 200, true),
            recorded(4, 0, "treasury@bank", "alice@bank", dec!(7), 400, false),
            recorded(5, 0, "treasury@bank", "carol@bank", dec!(7), 150, false),
        ])
        .await
        .unwrap();

        let page = repo
            .list_transfers("alice@bank", 400, PageRequest::new(1, 10))
            .unwrap();

        assert_eq!(page.total_elements, 3);
        let amounts: Vec<_> = page.items.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(0.25), dec!(1.5), dec!(3)]);
        assert_eq!(page.items[0].src_account_id, "alice@bank");
    }

    #[tokio::test]
    async fn test_list_transfers_pages() {
        let (repo, _temp_dir) = create_test_repository().await;
        let transfers = (0..5)
            .map(|i| recorded(i, 0, "treasury@bank", "alice@bank", dec!(1), i * 10, false))
            .collect();
        repo.record_transfers(transfers).await.unwrap();

        let second = repo
            .list_transfers("alice@bank", 1_000, PageRequest::new(2, 2))
            .unwrap();
        assert_eq!(second.total_pages, 3);
        assert_eq!(
            second.items.iter().map(|t| t.occurred_at).collect::<Vec<_>>(),
            vec![20, 30]
        );

        let last = repo
            .list_transfers("alice@bank", 1_000, PageRequest::new(3, 2))
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next());
    }

    #[tokio::test]
    async fn test_recording_is_idempotent() {
        let (repo, _temp_dir) = create_test_repository().await;
        let transfer = recorded(1, 0, "treasury@bank", "alice@bank", dec!(1), 10, false);

        assert_eq!(repo.record_transfers(vec![transfer.clone()]).await.unwrap(), 1);
        assert_eq!(repo.record_transfers(vec![transfer]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_accounts_by_domain() {
        let (repo, _temp_dir) = create_test_repository().await;
        repo.record_accounts(vec![
            LedgerAccount::new("bob", "bank"),
            LedgerAccount::new("alice", "bank"),
            LedgerAccount::new("dave", "fund"),
        ])
        .await
        .unwrap();

        let bank = repo
            .list_accounts(Some("bank"), PageRequest::new(1, 10))
            .unwrap();
        assert_eq!(
            bank.items.iter().map(LedgerAccount::account_id).collect::<Vec<_>>(),
            vec!["alice@bank", "bob@bank"]
        );

        let all = repo.list_accounts(None, PageRequest::new(1, 2)).unwrap();
        assert_eq!(all.total_elements, 3);
        assert_eq!(all.total_pages, 2);
    }
}
