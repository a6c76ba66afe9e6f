//! Custodian Core - Domain entities, services, and traits.
//!
//! This crate contains the custody fee and AUC accrual engine.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` crate.

pub mod billing;
pub mod config;
pub mod constants;
pub mod custody;
pub mod errors;
pub mod ledger;

pub use config::CustodyConfig;
pub use custody::{AccountCustodyResult, AssetCustody, CustodyService, CustodyServiceTrait};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
