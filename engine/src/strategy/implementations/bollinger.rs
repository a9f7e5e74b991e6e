//! Bollinger band touch rule

use crate::indicators::{calculate_bollinger, BollingerBands};
use crate::strategy::base::pair;
use crate::strategy::{BollingerParams, IndicatorFamily, Rule};

/// Fires when the close re-enters the bands from outside
#[derive(Debug, Clone)]
pub struct BollingerRule {
    pub bands: BollingerBands,
    pub closes: Vec<Option<f64>>,
}

impl BollingerRule {
    pub fn new(closes: &[f64], params: &BollingerParams) -> Self {
        Self {
            bands: calculate_bollinger(closes, params.n, params.k),
            closes: closes.iter().copied().map(Some).collect(),
        }
    }
}

impl Rule for BollingerRule {
    fn family(&self) -> IndicatorFamily {
        IndicatorFamily::Bollinger
    }

    fn should_buy(&self, i: usize) -> bool {
        match (pair(&self.bands.lower, i), pair(&self.closes, i)) {
            (Some((d0, d1)), Some((c0, c1))) => d0 > c0 && d1 <= c1,
            _ => false,
        }
    }

    fn should_sell(&self, i: usize) -> bool {
        match (pair(&self.bands.upper, i), pair(&self.closes, i)) {
            (Some((u0, u1)), Some((c0, c1))) => u0 < c0 && u1 >= c1,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_from_outside() {
        let rule = BollingerRule {
            bands: BollingerBands {
                upper: vec![Some(10.0), Some(10.0), Some(10.0)],
                middle: vec![Some(8.0), Some(8.0), Some(8.0)],
                lower: vec![Some(6.0), Some(6.0), Some(6.0)],
            },
            closes: vec![Some(5.0), Some(6.0), Some(11.0)],
        };
        assert!(rule.should_buy(1));
        assert!(!rule.should_buy(2));
        assert!(!rule.should_sell(2));

        let rule = BollingerRule {
            closes: vec![Some(11.0), Some(9.0), Some(9.0)],
            ..rule
        };
        assert!(rule.should_sell(1));
        assert!(!rule.should_sell(0));
    }
}
