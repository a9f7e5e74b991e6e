//! EMA (Exponential Moving Average) indicator

use crate::indicators::{run_series, Indicator};

/// EMA seeded with the SMA of its first `period` values
#[derive(Debug, Clone)]
pub struct EMA {
    period: usize,
    alpha: f64,
    update_count: usize,
    seed_sum: f64,
    last_value: Option<f64>,
}

impl EMA {
    /// Create new EMA indicator, `None` for a zero period
    pub fn new(period: usize) -> Option<Self> {
        if period == 0 {
            return None;
        }
        Some(Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            update_count: 0,
            seed_sum: 0.0,
            last_value: None,
        })
    }

    /// Get EMA period
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for EMA {
    fn name(&self) -> &str {
        "EMA"
    }

    fn update(&mut self, value: f64) {
        self.update_count += 1;
        match self.last_value {
            Some(prev) => self.last_value = Some(prev + self.alpha * (value - prev)),
            None => {
                self.seed_sum += value;
                if self.update_count == self.period {
                    self.last_value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
    }

    fn value(&self) -> Option<f64> {
        self.last_value
    }
}

/// Calculate EMA from a series of values
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    match EMA::new(period) {
        Some(ema) => run_series(ema, values),
        None => vec![None; values.len()],
    }
}

/// EMA over a series whose defined values form one contiguous tail
/// (e.g. the MACD line). Leading `None`s are kept; the EMA warms up on
/// the defined part only.
pub fn calculate_ema_aligned(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let start = values.iter().position(Option::is_some).unwrap_or(values.len());
    let mut out = vec![None; start];
    let Some(mut ema) = EMA::new(period) else {
        return vec![None; values.len()];
    };
    for value in &values[start..] {
        match value {
            Some(v) => {
                ema.update(*v);
                out.push(ema.value());
            }
            None => out.push(None),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seeded_with_sma() {
        assert_eq!(
            calculate_ema(&[3.0, 4.0, 5.0, 9.0], 3),
            vec![None, None, Some(4.0), Some(6.5)]
        );
    }

    #[test]
    fn test_ema_aligned_keeps_leading_gap() {
        let input = [None, None, Some(3.0), Some(4.0), Some(5.0), Some(9.0)];
        assert_eq!(
            calculate_ema_aligned(&input, 3),
            vec![None, None, None, None, Some(4.0), Some(6.5)]
        );
    }
}
