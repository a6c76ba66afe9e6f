//! SQLite storage implementation for the ledger mirror.

mod model;
mod repository;

pub use model::{LedgerAccountDB, LedgerTransferDB, NewLedgerAccountDB};
pub use repository::{LedgerMirrorRepository, RecordedTransfer};
