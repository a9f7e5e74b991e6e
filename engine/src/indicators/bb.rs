//! Bollinger Bands indicator

use serde::Serialize;

/// Upper, middle and lower band series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands: SMA(n) ± k · sample standard deviation.
///
/// Needs at least two samples per window; `n < 2` yields undefined bands.
pub fn calculate_bollinger(values: &[f64], n: usize, k: f64) -> BollingerBands {
    let len = values.len();
    let mut bands = BollingerBands {
        upper: vec![None; len],
        middle: vec![None; len],
        lower: vec![None; len],
    };
    if n < 2 {
        return bands;
    }

    let nf = n as f64;
    for (i, window) in values.windows(n).enumerate() {
        let idx = i + n - 1;
        let sum: f64 = window.iter().sum();
        let sum_sq: f64 = window.iter().map(|v| v * v).sum();
        let variance = ((nf * sum_sq - sum * sum) / (nf * (nf - 1.0))).max(0.0);
        let mid = sum / nf;
        let sigma = variance.sqrt();

        bands.middle[idx] = Some(mid);
        bands.upper[idx] = Some(mid + k * sigma);
        bands.lower[idx] = Some(mid - k * sigma);
    }
    bands
}
