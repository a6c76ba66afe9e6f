//! SQLite storage implementation for accrual snapshots.

mod model;
mod repository;

pub use model::CustodySnapshotDB;
pub use repository::CustodySnapshotRepository;
