//! Historical volatility

/// Calculate historical volatility: `100 · sqrt(population variance)` of the
/// trailing `period` log returns. Defined from index `period`.
pub fn calculate_hv(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let returns: Vec<Option<f64>> = values
        .windows(2)
        .map(|w| {
            let ratio = w[1] / w[0];
            (ratio.is_finite() && ratio > 0.0).then(|| ratio.ln())
        })
        .collect();

    for (i, window) in returns.windows(period).enumerate() {
        let Some(window) = window.iter().copied().collect::<Option<Vec<f64>>>() else {
            continue;
        };
        let n = period as f64;
        let mean = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        // returns[j] belongs to values[j + 1]
        out[i + period] = Some(100.0 * variance.sqrt());
    }
    out
}
