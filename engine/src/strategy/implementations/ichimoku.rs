//! Ichimoku cloud breakout rule

use crate::indicators::{calculate_ichimoku, IchimokuCloud};
use crate::strategy::base::{at, pair};
use crate::strategy::{IchimokuParams, IndicatorFamily, Rule};

/// Fires on a lagging-span breakout confirmed by the cloud and the
/// tenkan/base ordering
#[derive(Debug, Clone)]
pub struct IchimokuRule {
    pub cloud: IchimokuCloud,
    pub highs: Vec<Option<f64>>,
    pub lows: Vec<Option<f64>>,
    /// First index at which the rule may fire
    pub min_index: usize,
}

struct Snapshot {
    delay: (f64, f64),
    high: (f64, f64),
    low: (f64, f64),
    pre1: f64,
    pre2: f64,
    tenkan: f64,
    base: f64,
}

impl IchimokuRule {
    pub fn new(highs: &[f64], lows: &[f64], closes: &[f64], params: &IchimokuParams) -> Self {
        Self {
            cloud: calculate_ichimoku(highs, lows, closes, params.periods),
            highs: highs.iter().copied().map(Some).collect(),
            lows: lows.iter().copied().map(Some).collect(),
            min_index: params.periods.pre2,
        }
    }

    fn snapshot(&self, i: usize) -> Option<Snapshot> {
        if i < self.min_index {
            return None;
        }
        Some(Snapshot {
            delay: pair(&self.cloud.delay, i)?,
            high: pair(&self.highs, i)?,
            low: pair(&self.lows, i)?,
            pre1: at(&self.cloud.pre1, i)?,
            pre2: at(&self.cloud.pre2, i)?,
            tenkan: at(&self.cloud.tenkan, i)?,
            base: at(&self.cloud.base, i)?,
        })
    }
}

impl Rule for IchimokuRule {
    fn family(&self) -> IndicatorFamily {
        IndicatorFamily::Ichimoku
    }

    fn should_buy(&self, i: usize) -> bool {
        self.snapshot(i).is_some_and(|s| {
            s.delay.0 < s.high.0
                && s.delay.1 >= s.high.1
                && s.pre1 < s.low.1
                && s.pre2 < s.low.1
                && s.tenkan > s.base
        })
    }

    fn should_sell(&self, i: usize) -> bool {
        self.snapshot(i).is_some_and(|s| {
            s.delay.0 > s.low.0
                && s.delay.1 <= s.low.1
                && s.pre1 > s.high.1
                && s.pre2 > s.high.1
                && s.tenkan < s.base
        })
    }
}
