use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::CustodySnapshotDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::custody_snapshots;
use custodian_core::custody::{AccrualSnapshot, CustodySnapshotRepositoryTrait};
use custodian_core::errors::Result;

pub struct CustodySnapshotRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CustodySnapshotRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// All snapshots of one pair, oldest control timestamp first.
    pub fn list_snapshots(&self, account: &str, asset: &str) -> Result<Vec<AccrualSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        custody_snapshots::table
            .filter(custody_snapshots::account_id.eq(account))
            .filter(custody_snapshots::asset_id.eq(asset))
            .order(custody_snapshots::control_timestamp.asc())
            .select(CustodySnapshotDB::as_select())
            .load::<CustodySnapshotDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(AccrualSnapshot::try_from)
            .collect()
    }
}

#[async_trait]
impl CustodySnapshotRepositoryTrait for CustodySnapshotRepository {
    fn most_recent_at_or_before(
        &self,
        account: &str,
        asset: &str,
        timestamp: i64,
    ) -> Result<Option<AccrualSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        custody_snapshots::table
            .filter(custody_snapshots::account_id.eq(account))
            .filter(custody_snapshots::asset_id.eq(asset))
            .filter(custody_snapshots::control_timestamp.le(timestamp))
            .order((
                custody_snapshots::control_timestamp.desc(),
                custody_snapshots::created_at.desc(),
            ))
            .select(CustodySnapshotDB::as_select())
            .first::<CustodySnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(AccrualSnapshot::try_from)
            .transpose()
    }

    async fn append(&self, snapshot: &AccrualSnapshot) -> Result<()> {
        let snapshot_db = CustodySnapshotDB::from(snapshot);
        debug!(
            "Appending accrual snapshot for {}/{} at {}",
            snapshot_db.account_id, snapshot_db.asset_id, snapshot_db.control_timestamp
        );
        self.writer
            .exec(move |conn| {
                diesel::insert_into(custody_snapshots::table)
                    .values(&snapshot_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
