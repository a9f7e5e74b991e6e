//! MACD (Moving Average Convergence Divergence) indicator

use crate::indicators::{calculate_ema, calculate_ema_aligned};
use serde::Serialize;

/// MACD line, signal line and histogram series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// Calculate MACD = EMA(short) − EMA(long), its EMA(signal) and histogram
pub fn calculate_macd(values: &[f64], short: usize, long: usize, signal: usize) -> MacdSeries {
    let fast = calculate_ema(values, short);
    let slow = calculate_ema(values, long);

    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| Some(f.as_ref()? - s.as_ref()?))
        .collect();
    let signal = calculate_ema_aligned(&macd, signal);
    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some(m.as_ref()? - s.as_ref()?))
        .collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_warmup() {
        let values: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let out = calculate_macd(&values, 3, 5, 3);

        assert!(out.macd[..4].iter().all(Option::is_none));
        assert!(out.macd[4].is_some());
        // signal needs three defined macd values
        assert!(out.signal[5].is_none());
        assert!(out.signal[6].is_some());
        assert!(out.histogram[5].is_none());
        assert!(out.histogram[6].is_some());
    }

    #[test]
    fn test_macd_line_on_linear_trend() {
        // On a linear series EMA lags by (period - 1) / 2 steps
        let values: Vec<f64> = (0..40).map(|v| v as f64).collect();
        let out = calculate_macd(&values, 3, 5, 3);
        let last = out.macd[39].unwrap();
        assert!((last - 1.0).abs() < 1e-9);
    }
}
