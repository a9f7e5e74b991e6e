//! Engine: the decision and aggregation pipeline of the trading bot
//!
//! Ticks flow in from an exchange feed, are folded into fixed-duration OHLCV
//! candles, and every newly opened candle triggers one trading cycle:
//!
//! - **Data**: tick/candle model, candle aggregation and store traits
//! - **Indicators**: SMA, EMA, Bollinger Bands, Ichimoku, RSI, MACD, HV
//! - **Strategy**: per-indicator buy/sell rules and tuned parameters
//! - **Portfolio**: the signal ledger and exchange balances
//! - **Backtest**: brute-force parameter optimisation over history
//! - **Controller**: single-flight trading cycles and order confirmation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ::engine::prelude::*;
//!
//! # async fn run(exchange: Arc<dyn ExchangeClient>) -> ::engine::Result<()> {
//! let store = Arc::new(InMemoryStore::new());
//! let controller = Arc::new(Controller::new(
//!     TradingConfig::default(),
//!     exchange,
//!     store.clone(),
//!     store,
//! ));
//! controller.bootstrap().await?;
//! controller.trigger();
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod chart;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod exchange;
pub mod indicators;
pub mod ingest;
pub mod portfolio;
pub mod strategy;

pub use error::{EngineError, Result};

// Re-export commonly used types
pub mod prelude {
    pub use crate::backtest::*;
    pub use crate::chart::*;
    pub use crate::config::*;
    pub use crate::controller::*;
    pub use crate::data::*;
    pub use crate::exchange::*;
    pub use crate::indicators::*;
    pub use crate::ingest::*;
    pub use crate::portfolio::*;
    pub use crate::strategy::*;

    pub use crate::{EngineError, Result};
}
