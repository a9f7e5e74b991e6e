//! Portfolio management module

pub mod balance;
pub mod ledger;

pub use balance::*;
pub use ledger::*;
