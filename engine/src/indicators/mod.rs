//! Technical indicators module
//!
//! Every `calculate_*` function returns series positionally aligned with its
//! input: `None` marks indices inside the warm-up window, and an undefined
//! input propagates to every value computed from it.

pub mod bb;
pub mod ema;
pub mod hv;
pub mod ichimoku;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bb::*;
pub use ema::*;
pub use hv::*;
pub use ichimoku::*;
pub use macd::*;
pub use rsi::*;
pub use sma::*;

/// Streaming indicator fed one value at a time
pub trait Indicator {
    /// Get the name of the indicator
    fn name(&self) -> &str;

    /// Update indicator with new value
    fn update(&mut self, value: f64);

    /// Get current indicator value
    fn value(&self) -> Option<f64>;

    /// Check if indicator is ready (has enough data)
    fn is_ready(&self) -> bool {
        self.value().is_some()
    }
}

/// Run a streaming indicator over a series
pub(crate) fn run_series<I: Indicator>(mut indicator: I, values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|&value| {
            indicator.update(value);
            indicator.value()
        })
        .collect()
}
