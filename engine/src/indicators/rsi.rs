//! RSI (Relative Strength Index) indicator

use crate::indicators::{run_series, Indicator};
use std::collections::VecDeque;

/// Keeps the denominator non-zero on flat windows
const RSI_EPSILON: f64 = 1e-10;

/// RSI over the trailing `period` price deltas
#[derive(Debug, Clone)]
pub struct RSI {
    period: usize,
    prev: Option<f64>,
    deltas: VecDeque<f64>,
}

impl RSI {
    /// Create new RSI indicator, `None` for a zero period
    pub fn new(period: usize) -> Option<Self> {
        if period == 0 {
            return None;
        }
        Some(Self {
            period,
            prev: None,
            deltas: VecDeque::with_capacity(period),
        })
    }

    /// Get RSI period
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for RSI {
    fn name(&self) -> &str {
        "RSI"
    }

    fn update(&mut self, value: f64) {
        if let Some(prev) = self.prev {
            if self.deltas.len() == self.period {
                self.deltas.pop_front();
            }
            self.deltas.push_back(value - prev);
        }
        self.prev = Some(value);
    }

    fn value(&self) -> Option<f64> {
        if self.deltas.len() < self.period {
            return None;
        }
        let up: f64 = self.deltas.iter().filter(|d| **d > 0.0).sum();
        let down: f64 = self.deltas.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
        Some(100.0 * up / (up + down + RSI_EPSILON))
    }
}

/// Calculate RSI from a series of values; defined from index `period`
pub fn calculate_rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    match RSI::new(period) {
        Some(rsi) => run_series(rsi, values),
        None => vec![None; values.len()],
    }
}
