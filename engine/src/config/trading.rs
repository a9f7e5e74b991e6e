//! Trading controller configuration

use crate::data::CandleDuration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Instrument traded (e.g., "BTC_JPY")
    pub product_code: String,
    /// Bar size that drives trading cycles
    pub trade_duration: CandleDuration,
    /// Bar sizes aggregated from the tick stream
    pub durations: Vec<CandleDuration>,
    /// Fraction of the available quote balance spent per buy
    pub use_percent: f64,
    /// Candles fetched per cycle and per optimisation
    pub data_limit: usize,
    /// Loss-cut floor as a fraction of the buy fill close
    pub stop_limit_percent: f64,
    /// Number of top-ranked families enabled by the optimiser
    pub num_ranking: usize,
    /// Record fills locally instead of sending orders
    pub back_test: bool,
    /// Bars older than this are never traded live
    pub start_time: DateTime<Utc>,
    /// Exchange fee deducted from order sizes
    pub fee_rate: f64,
    /// Minutes before a sent order expires on the exchange
    pub order_expire_minutes: u32,
    /// Total time spent waiting for an order to complete
    #[serde(with = "secs")]
    pub poll_expiry: Duration,
    /// Pause between order status checks
    #[serde(with = "secs")]
    pub poll_interval: Duration,
    /// Fixed size used by backtests and simulated fills
    pub backtest_size: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            product_code: "BTC_JPY".to_string(),
            trade_duration: CandleDuration::Minute,
            durations: CandleDuration::ALL.to_vec(),
            use_percent: 0.9,
            data_limit: 365,
            stop_limit_percent: 0.9,
            num_ranking: 2,
            back_test: false,
            start_time: Utc::now(),
            fee_rate: 0.0012,
            order_expire_minutes: 1,
            poll_expiry: Duration::from_secs(60),
            poll_interval: Duration::from_secs(15),
            backtest_size: 1.0,
        }
    }
}

impl TradingConfig {
    /// Base and quote currency of the product code ("BTC_JPY" -> BTC, JPY)
    pub fn currencies(&self) -> (&str, &str) {
        self.product_code
            .split_once('_')
            .unwrap_or((self.product_code.as_str(), ""))
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currencies() {
        let config = TradingConfig::default();
        assert_eq!(config.currencies(), ("BTC", "JPY"));
    }
}
