//! Trading controller module
//!
//! Single-flight trading cycles, order confirmation polling and
//! re-optimisation of the rule parameters.

pub mod cycle;
pub mod gate;
pub mod poller;

pub use cycle::*;
pub use gate::*;
pub use poller::*;
