//! Billing rate directory: models, lookup trait and the per-run rate memo.

mod billing_model;
mod billing_traits;
mod rate_cache;

pub use billing_model::*;
pub use billing_traits::*;
pub use rate_cache::*;
