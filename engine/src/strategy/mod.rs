//! Strategy module
//!
//! Per-indicator buy/sell rules, their tuned parameters and the vote tally.

pub mod base;
pub mod implementations;
pub mod params;
pub mod signal;

pub use base::*;
pub use implementations::*;
pub use params::*;
pub use signal::*;
