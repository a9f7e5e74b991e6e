//! Exchange integration module
//!
//! The engine talks to the exchange only through [`ExchangeClient`].

pub mod client;
pub mod order;

pub use client::*;
pub use order::*;
