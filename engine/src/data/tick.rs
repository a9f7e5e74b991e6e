//! Realtime ticker events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One realtime ticker event from the exchange feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub product_code: String,
    pub timestamp: DateTime<Utc>,
    pub tick_id: u64,
    pub best_bid: f64,
    pub best_ask: f64,
    pub best_bid_size: f64,
    pub best_ask_size: f64,
    pub total_bid_depth: f64,
    pub total_ask_depth: f64,
    /// Last traded price
    pub ltp: f64,
    pub volume: f64,
    pub volume_by_product: f64,
}

impl Ticker {
    /// Average of best bid and best ask
    pub fn mid_price(&self) -> f64 {
        (self.best_bid + self.best_ask) / 2.0
    }
}
