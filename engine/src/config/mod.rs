//! Configuration module

pub mod trading;

pub use trading::*;
