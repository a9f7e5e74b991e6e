//! SMA (Simple Moving Average) indicator

use crate::indicators::{run_series, Indicator};
use ta::indicators::SimpleMovingAverage;
use ta::Next;

/// SMA indicator wrapper
#[derive(Debug)]
pub struct SMA {
    inner: SimpleMovingAverage,
    period: usize,
    update_count: usize,
    last_value: Option<f64>,
}

impl SMA {
    /// Create new SMA indicator, `None` for a zero period
    pub fn new(period: usize) -> Option<Self> {
        Some(Self {
            inner: SimpleMovingAverage::new(period).ok()?,
            period,
            update_count: 0,
            last_value: None,
        })
    }

    /// Get SMA period
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for SMA {
    fn name(&self) -> &str {
        "SMA"
    }

    fn update(&mut self, value: f64) {
        let sma_value = self.inner.next(value);
        self.update_count += 1;
        if self.update_count >= self.period {
            self.last_value = Some(sma_value);
        }
    }

    fn value(&self) -> Option<f64> {
        self.last_value
    }
}

/// Calculate SMA from a series of values
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    match SMA::new(period) {
        Some(sma) => run_series(sma, values),
        None => vec![None; values.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_warmup_and_values() {
        assert_eq!(
            calculate_sma(&[3.0, 4.0, 5.0, 9.0], 3),
            vec![None, None, Some(4.0), Some(6.0)]
        );
    }

    #[test]
    fn test_sma_zero_period_is_undefined() {
        assert_eq!(calculate_sma(&[1.0, 2.0], 0), vec![None, None]);
    }
}
