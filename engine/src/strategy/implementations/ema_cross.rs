//! EMA-cross rule

use crate::indicators::calculate_ema;
use crate::strategy::base::pair;
use crate::strategy::{EmaParams, IndicatorFamily, Rule};

/// Fires when the `period1` EMA crosses the `period2` EMA
#[derive(Debug, Clone)]
pub struct EmaCrossRule {
    pub fast: Vec<Option<f64>>,
    pub slow: Vec<Option<f64>>,
}

impl EmaCrossRule {
    pub fn new(closes: &[f64], params: &EmaParams) -> Self {
        Self {
            fast: calculate_ema(closes, params.period1),
            slow: calculate_ema(closes, params.period2),
        }
    }
}

impl Rule for EmaCrossRule {
    fn family(&self) -> IndicatorFamily {
        IndicatorFamily::Ema
    }

    fn should_buy(&self, i: usize) -> bool {
        match (pair(&self.fast, i), pair(&self.slow, i)) {
            (Some((f0, f1)), Some((s0, s1))) => f0 < s0 && f1 >= s1,
            _ => false,
        }
    }

    fn should_sell(&self, i: usize) -> bool {
        match (pair(&self.fast, i), pair(&self.slow, i)) {
            (Some((f0, f1)), Some((s0, s1))) => f0 > s0 && f1 <= s1,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_up_and_down() {
        let rule = EmaCrossRule {
            fast: vec![None, Some(1.0), Some(3.0), Some(1.0)],
            slow: vec![None, Some(2.0), Some(2.0), Some(2.0)],
        };
        assert!(!rule.should_buy(1));
        assert!(rule.should_buy(2));
        assert!(!rule.should_sell(2));
        assert!(rule.should_sell(3));
    }
}
