use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::BillingRateDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::billing_rates;
use crate::schema::billing_rates::dsl::*;
use custodian_core::billing::{BillingRate, BillingRateRepositoryTrait, BillingType};
use custodian_core::errors::Result;

pub struct BillingRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl BillingRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Inserts a rate or replaces the fee fraction of an existing one.
    ///
    /// The creation time of an existing rate is kept.
    pub async fn upsert_rate(&self, rate: BillingRate) -> Result<BillingRate> {
        let rate_db = BillingRateDB::from(rate);
        debug!(
            "Upserting {} rate for {} in scope {}",
            rate_db.billing_type, rate_db.asset_id, rate_db.scope_account_id
        );
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BillingRate> {
                let result_db = diesel::insert_into(billing_rates::table)
                    .values(&rate_db)
                    .on_conflict((scope_account_id, asset_id, billing_type))
                    .do_update()
                    .set((
                        fee_fraction.eq(&rate_db.fee_fraction),
                        updated.eq(rate_db.updated),
                    ))
                    .returning(BillingRateDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                BillingRate::try_from(result_db)
            })
            .await
    }
}

impl BillingRateRepositoryTrait for BillingRepository {
    fn find_rate(
        &self,
        scope: &str,
        asset: &str,
        kind: BillingType,
    ) -> Result<Option<BillingRate>> {
        let mut conn = get_connection(&self.pool)?;
        let rate_db = billing_rates
            .filter(scope_account_id.eq(scope))
            .filter(asset_id.eq(asset))
            .filter(billing_type.eq(kind.as_str()))
            .select(BillingRateDB::as_select())
            .first::<BillingRateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        rate_db.map(BillingRate::try_from).transpose()
    }
}
