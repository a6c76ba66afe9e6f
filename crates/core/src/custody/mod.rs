//! Custody fee and AUC accrual engine.

mod accrual;
mod custody_model;
pub mod custody_service;
mod snapshot_policy;
mod snapshot_traits;

pub use accrual::*;
pub use custody_model::*;
pub use custody_service::*;
pub use snapshot_policy::*;
pub use snapshot_traits::*;
