//! Tuned rule parameters

use crate::indicators::IchimokuPeriods;
use serde::{Deserialize, Serialize};

/// EMA-cross parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaParams {
    pub enabled: bool,
    pub period1: usize,
    pub period2: usize,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self {
            enabled: false,
            period1: 7,
            period2: 14,
        }
    }
}

/// Bollinger touch parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerParams {
    pub enabled: bool,
    pub n: usize,
    pub k: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            enabled: false,
            n: 20,
            k: 2.0,
        }
    }
}

/// Ichimoku breakout parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IchimokuParams {
    pub enabled: bool,
    #[serde(flatten)]
    pub periods: IchimokuPeriods,
}

/// MACD histogram-cross parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub enabled: bool,
    pub short_period: usize,
    pub long_period: usize,
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            enabled: false,
            short_period: 12,
            long_period: 26,
            signal_period: 9,
        }
    }
}

/// RSI threshold-cross parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub enabled: bool,
    pub period: usize,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 14,
            buy_threshold: 30.0,
            sell_threshold: 70.0,
        }
    }
}

/// Parameter snapshot for every indicator family.
///
/// Replaced wholesale on each re-optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeParams {
    pub ema: EmaParams,
    pub bollinger: BollingerParams,
    pub ichimoku: IchimokuParams,
    pub macd: MacdParams,
    pub rsi: RsiParams,
}

impl TradeParams {
    /// Number of enabled families
    pub fn enabled_count(&self) -> usize {
        [
            self.ema.enabled,
            self.bollinger.enabled,
            self.ichimoku.enabled,
            self.macd.enabled,
            self.rsi.enabled,
        ]
        .into_iter()
        .filter(|e| *e)
        .count()
    }
}
