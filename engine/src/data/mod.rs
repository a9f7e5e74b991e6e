//! Data management module
//!
//! Ticks, OHLCV candles, aggregation and the persistence traits.

pub mod aggregator;
pub mod candle;
pub mod storage;
pub mod tick;

pub use aggregator::*;
pub use candle::*;
pub use storage::*;
pub use tick::*;
