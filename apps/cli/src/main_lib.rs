use std::sync::Arc;

use custodian_core::CustodyService;
use custodian_storage_sqlite::billing::BillingRepository;
use custodian_storage_sqlite::custody::CustodySnapshotRepository;
use custodian_storage_sqlite::db::{self, spawn_writer};
use custodian_storage_sqlite::ledger::LedgerMirrorRepository;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

pub fn init_tracing() {
    let log_format = std::env::var("CUSTODIAN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the JSON report.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Opens the database, applies migrations and wires the accrual service.
pub fn build_service(config: &Config) -> anyhow::Result<CustodyService> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let ledger_repository = Arc::new(LedgerMirrorRepository::new(pool.clone(), writer.clone()));
    let billing_repository = Arc::new(BillingRepository::new(pool.clone(), writer.clone()));
    let snapshot_repository = Arc::new(CustodySnapshotRepository::new(pool, writer));

    let service = CustodyService::new(
        ledger_repository,
        billing_repository,
        snapshot_repository,
        config.custody.clone(),
    )?;
    Ok(service)
}
