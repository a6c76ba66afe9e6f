//! SQLite storage implementation for the billing rate directory.

mod model;
mod repository;

pub use model::BillingRateDB;
pub use repository::BillingRepository;
