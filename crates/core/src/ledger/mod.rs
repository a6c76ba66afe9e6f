//! Ledger mirror models and repository traits.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::*;
pub use ledger_traits::*;
