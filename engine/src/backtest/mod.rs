//! Backtesting and parameter optimisation module

pub mod engine;
pub mod optimizer;
pub mod report;

pub use engine::*;
pub use optimizer::*;
pub use report::*;
