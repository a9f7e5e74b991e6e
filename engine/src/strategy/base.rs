//! Rule trait and indicator families

use serde::{Deserialize, Serialize};
use std::fmt;

/// Indicator families a rule can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorFamily {
    Ema,
    Bollinger,
    Ichimoku,
    Macd,
    Rsi,
}

impl IndicatorFamily {
    /// Families the optimizer may enable, in enumeration order
    pub const RANKED: [IndicatorFamily; 4] = [Self::Ema, Self::Bollinger, Self::Macd, Self::Rsi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ema => "ema",
            Self::Bollinger => "bollinger",
            Self::Ichimoku => "ichimoku",
            Self::Macd => "macd",
            Self::Rsi => "rsi",
        }
    }
}

impl fmt::Display for IndicatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Stateless buy/sell evaluator over precomputed indicator series.
///
/// Both `i - 1` and `i` must be defined for a rule to fire.
pub trait Rule: Send + Sync {
    fn family(&self) -> IndicatorFamily;

    fn should_buy(&self, i: usize) -> bool;

    fn should_sell(&self, i: usize) -> bool;
}

/// Values at `i - 1` and `i`, when both are defined
pub(crate) fn pair(series: &[Option<f64>], i: usize) -> Option<(f64, f64)> {
    let prev = (*series.get(i.checked_sub(1)?)?)?;
    let cur = (*series.get(i)?)?;
    Some((prev, cur))
}

/// Defined value at `i`
pub(crate) fn at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}
