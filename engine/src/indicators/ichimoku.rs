//! Ichimoku Kinko Hyo

use serde::{Deserialize, Serialize};
use ta::indicators::{Maximum, Minimum};
use ta::Next;

/// Ichimoku line periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IchimokuPeriods {
    pub tenkan: usize,
    pub base: usize,
    /// Bars the leading spans are plotted ahead
    pub pre1_shift: usize,
    pub pre2: usize,
    /// Bars the lagging span is plotted behind
    pub delay: usize,
}

impl Default for IchimokuPeriods {
    fn default() -> Self {
        Self {
            tenkan: 9,
            base: 26,
            pre1_shift: 26,
            pre2: 52,
            delay: 26,
        }
    }
}

/// Ichimoku line series, all aligned with the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IchimokuCloud {
    pub tenkan: Vec<Option<f64>>,
    pub base: Vec<Option<f64>>,
    /// Leading span A
    pub pre1: Vec<Option<f64>>,
    /// Leading span B
    pub pre2: Vec<Option<f64>>,
    /// Lagging span
    pub delay: Vec<Option<f64>>,
}

/// Midpoint of the highest high and lowest low over a trailing window
fn channel_midpoint(highs: &[f64], lows: &[f64], period: usize) -> Vec<Option<f64>> {
    let (Ok(mut max), Ok(mut min)) = (Maximum::new(period), Minimum::new(period)) else {
        return vec![None; highs.len()];
    };
    highs
        .iter()
        .zip(lows)
        .enumerate()
        .map(|(i, (&h, &l))| {
            let hi = max.next(h);
            let lo = min.next(l);
            (i + 1 >= period).then(|| (hi + lo) / 2.0)
        })
        .collect()
}

/// Shift a series `by` bars into the future, truncated to the input length
fn shift_forward(series: &[Option<f64>], by: usize) -> Vec<Option<f64>> {
    let len = series.len();
    std::iter::repeat(None)
        .take(by.min(len))
        .chain(series.iter().take(len.saturating_sub(by)).copied())
        .collect()
}

/// Calculate the Ichimoku lines.
///
/// `delay[i]` is the close `periods.delay` bars after `i`, undefined for the
/// most recent `periods.delay` bars.
pub fn calculate_ichimoku(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    periods: IchimokuPeriods,
) -> IchimokuCloud {
    let tenkan = channel_midpoint(highs, lows, periods.tenkan);
    let base = channel_midpoint(highs, lows, periods.base);

    let pre1_raw: Vec<Option<f64>> = tenkan
        .iter()
        .zip(&base)
        .map(|(t, b)| Some((t.as_ref()? + b.as_ref()?) / 2.0))
        .collect();
    let pre2_raw = channel_midpoint(highs, lows, periods.pre2);

    let delay = (0..closes.len())
        .map(|i| closes.get(i + periods.delay).copied())
        .collect();

    IchimokuCloud {
        pre1: shift_forward(&pre1_raw, periods.pre1_shift),
        pre2: shift_forward(&pre2_raw, periods.pre1_shift),
        tenkan,
        base,
        delay,
    }
}
