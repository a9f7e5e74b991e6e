//! MACD histogram-cross rule

use crate::indicators::{calculate_macd, MacdSeries};
use crate::strategy::base::{at, pair};
use crate::strategy::{IndicatorFamily, MacdParams, Rule};

/// Fires when the histogram changes sign while both lines sit on the same side of zero
#[derive(Debug, Clone)]
pub struct MacdRule {
    pub series: MacdSeries,
}

impl MacdRule {
    pub fn new(closes: &[f64], params: &MacdParams) -> Self {
        Self {
            series: calculate_macd(closes, params.short_period, params.long_period, params.signal_period),
        }
    }

    fn lines(&self, i: usize) -> Option<(f64, f64, f64, f64)> {
        let macd = at(&self.series.macd, i)?;
        let signal = at(&self.series.signal, i)?;
        let (h0, h1) = pair(&self.series.histogram, i)?;
        Some((macd, signal, h0, h1))
    }
}

impl Rule for MacdRule {
    fn family(&self) -> IndicatorFamily {
        IndicatorFamily::Macd
    }

    fn should_buy(&self, i: usize) -> bool {
        self.lines(i)
            .is_some_and(|(macd, signal, h0, h1)| macd < 0.0 && signal < 0.0 && h0 < 0.0 && h1 >= 0.0)
    }

    fn should_sell(&self, i: usize) -> bool {
        self.lines(i)
            .is_some_and(|(macd, signal, h0, h1)| macd > 0.0 && signal > 0.0 && h0 > 0.0 && h1 <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_cross_below_zero() {
        let rule = MacdRule {
            series: MacdSeries {
                macd: vec![Some(-2.0), Some(-1.0), Some(1.0)],
                signal: vec![Some(-1.0), Some(-1.0), Some(0.5)],
                histogram: vec![Some(-1.0), Some(0.0), Some(0.5)],
            },
        };
        assert!(rule.should_buy(1));
        assert!(!rule.should_buy(0));
        // histogram already non-negative at i - 1
        assert!(!rule.should_buy(2));
    }

    #[test]
    fn test_histogram_cross_above_zero() {
        let rule = MacdRule {
            series: MacdSeries {
                macd: vec![Some(2.0), Some(1.0)],
                signal: vec![Some(1.0), Some(1.0)],
                histogram: vec![Some(1.0), Some(0.0)],
            },
        };
        assert!(rule.should_sell(1));
        assert!(!rule.should_buy(1));
    }
}
