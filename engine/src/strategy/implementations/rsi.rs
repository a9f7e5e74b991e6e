//! RSI threshold-cross rule

use crate::indicators::calculate_rsi;
use crate::strategy::base::pair;
use crate::strategy::{IndicatorFamily, Rule, RsiParams};

/// Fires when RSI crosses into the buy or sell threshold
#[derive(Debug, Clone)]
pub struct RsiRule {
    pub values: Vec<Option<f64>>,
    pub buy_threshold: f64,
    pub sell_threshold: f64,
}

impl RsiRule {
    pub fn new(closes: &[f64], params: &RsiParams) -> Self {
        Self {
            values: calculate_rsi(closes, params.period),
            buy_threshold: params.buy_threshold,
            sell_threshold: params.sell_threshold,
        }
    }
}

impl Rule for RsiRule {
    fn family(&self) -> IndicatorFamily {
        IndicatorFamily::Rsi
    }

    fn should_buy(&self, i: usize) -> bool {
        pair(&self.values, i).is_some_and(|(v0, v1)| v0 < self.buy_threshold && v1 >= self.buy_threshold)
    }

    fn should_sell(&self, i: usize) -> bool {
        pair(&self.values, i).is_some_and(|(v0, v1)| v0 > self.sell_threshold && v1 <= self.sell_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_cross() {
        let rule = RsiRule {
            values: vec![None, Some(25.0), Some(30.0), Some(75.0), Some(70.0)],
            buy_threshold: 30.0,
            sell_threshold: 70.0,
        };
        assert!(!rule.should_buy(1));
        assert!(rule.should_buy(2));
        assert!(rule.should_sell(4));
        assert!(!rule.should_sell(3));
    }
}
