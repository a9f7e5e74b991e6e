//! Rule implementations, one per indicator family

pub mod bollinger;
pub mod ema_cross;
pub mod ichimoku;
pub mod macd;
pub mod rsi;

pub use bollinger::*;
pub use ema_cross::*;
pub use ichimoku::*;
pub use macd::*;
pub use rsi::*;
