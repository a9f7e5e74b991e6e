//! Replays a candle series through one rule into a fresh ledger

use crate::data::CandleSeries;
use crate::portfolio::SignalLedger;
use crate::strategy::{
    BollingerParams, BollingerRule, EmaCrossRule, EmaParams, IchimokuParams, IchimokuRule, MacdParams,
    MacdRule, Rule, RsiParams, RsiRule,
};

/// Backtesting engine over one candle series
#[derive(Debug, Clone, Copy)]
pub struct Backtester<'a> {
    series: &'a CandleSeries,
    trade_size: f64,
}

impl<'a> Backtester<'a> {
    pub fn new(series: &'a CandleSeries, trade_size: f64) -> Self {
        Self { series, trade_size }
    }

    pub fn series(&self) -> &'a CandleSeries {
        self.series
    }

    /// Run `rule` over every bar, buying and selling at the close
    pub fn run(&self, rule: &dyn Rule) -> SignalLedger {
        let mut ledger = SignalLedger::new(
            self.series
                .first()
                .map(|c| c.product_code.clone())
                .unwrap_or_default(),
        );
        for (i, candle) in self.series.candles().iter().enumerate().skip(1) {
            if rule.should_buy(i) {
                ledger.buy(candle.time, candle.close, self.trade_size);
            }
            if rule.should_sell(i) {
                ledger.sell(candle.time, candle.close, self.trade_size);
            }
        }
        ledger
    }

    fn long_enough(&self, periods: &[usize]) -> bool {
        periods.iter().all(|p| self.series.len() >= *p)
    }

    pub fn ema(&self, params: &EmaParams) -> Option<SignalLedger> {
        self.long_enough(&[params.period1, params.period2])
            .then(|| self.run(&EmaCrossRule::new(&self.series.closes(), params)))
    }

    pub fn bollinger(&self, params: &BollingerParams) -> Option<SignalLedger> {
        self.long_enough(&[params.n])
            .then(|| self.run(&BollingerRule::new(&self.series.closes(), params)))
    }

    pub fn ichimoku(&self, params: &IchimokuParams) -> Option<SignalLedger> {
        self.long_enough(&[params.periods.pre2]).then(|| {
            self.run(&IchimokuRule::new(
                &self.series.highs(),
                &self.series.lows(),
                &self.series.closes(),
                params,
            ))
        })
    }

    pub fn macd(&self, params: &MacdParams) -> Option<SignalLedger> {
        self.long_enough(&[params.short_period, params.long_period, params.signal_period])
            .then(|| self.run(&MacdRule::new(&self.series.closes(), params)))
    }

    pub fn rsi(&self, params: &RsiParams) -> Option<SignalLedger> {
        self.long_enough(&[params.period])
            .then(|| self.run(&RsiRule::new(&self.series.closes(), params)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Candle, CandleDuration};
    use chrono::{Duration, TimeZone, Utc};

    fn series(closes: &[f64]) -> CandleSeries {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new("BTC_JPY", CandleDuration::Minute, t0 + Duration::minutes(i as i64), c, c, c, c, 1.0))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_rsi_backtest_trades_at_close() {
        // RSI(2): [-, -, 0, 0, 50, 100, 100, 50, 0]
        let s = series(&[5.0, 4.0, 3.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0]);
        let params = RsiParams {
            enabled: true,
            period: 2,
            buy_threshold: 30.0,
            sell_threshold: 70.0,
        };

        let ledger = Backtester::new(&s, 1.0).rsi(&params).unwrap();
        let prices: Vec<f64> = ledger.signals().iter().map(|e| e.price).collect();
        assert_eq!(prices, vec![3.0, 4.0]);
        assert_eq!(ledger.profit(), 1.0);
    }

    #[test]
    fn test_short_series_is_skipped() {
        let s = series(&[1.0, 2.0, 3.0]);
        assert!(Backtester::new(&s, 1.0).ema(&EmaParams::default()).is_none());
    }
}
