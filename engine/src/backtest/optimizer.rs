//! Brute-force grid search over rule parameters

use crate::backtest::{Backtester, OptimizationReport, Ranking};
use crate::data::CandleSeries;
use crate::portfolio::SignalLedger;
use crate::strategy::{
    BollingerParams, EmaParams, IchimokuParams, IndicatorFamily, MacdParams, RsiParams, TradeParams,
};
use std::ops::Range;
use tracing::{debug, info};

pub const EMA_PERIOD1_GRID: Range<usize> = 5..12;
pub const EMA_PERIOD2_GRID: Range<usize> = 12..20;
pub const BB_N_GRID: Range<usize> = 10..20;
/// Tenths of k: 1.7 ..= 2.2
pub const BB_K_TENTHS_GRID: Range<u32> = 17..23;
pub const MACD_SHORT_GRID: Range<usize> = 10..20;
pub const MACD_LONG_GRID: Range<usize> = 20..30;
pub const MACD_SIGNAL_GRID: Range<usize> = 5..15;
pub const RSI_PERIOD_GRID: Range<usize> = 10..20;
pub const RSI_BUY_GRID: Range<u32> = 27..33;
pub const RSI_SELL_GRID: Range<u32> = 67..73;

/// Best parameters found for one family and their profit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyOptimum<P> {
    pub performance: f64,
    pub params: P,
}

/// Grid-search optimiser over one candle series.
///
/// A pure function of the series: repeated runs give identical results.
#[derive(Debug, Clone, Copy)]
pub struct Optimizer<'a> {
    backtester: Backtester<'a>,
}

impl<'a> Optimizer<'a> {
    pub fn new(series: &'a CandleSeries, trade_size: f64) -> Self {
        Self {
            backtester: Backtester::new(series, trade_size),
        }
    }

    /// Keep the candidate only when its profit is strictly greater
    fn search<P: Copy>(default: P, candidates: impl Iterator<Item = P>, run: impl Fn(&P) -> Option<SignalLedger>) -> FamilyOptimum<P> {
        let mut best = FamilyOptimum {
            performance: 0.0,
            params: default,
        };
        for params in candidates {
            let Some(ledger) = run(&params) else {
                continue;
            };
            let profit = ledger.profit();
            if best.performance < profit {
                best = FamilyOptimum {
                    performance: profit,
                    params,
                };
            }
        }
        best
    }

    pub fn optimize_ema(&self) -> FamilyOptimum<EmaParams> {
        let candidates = EMA_PERIOD1_GRID.flat_map(|period1| {
            EMA_PERIOD2_GRID.map(move |period2| EmaParams {
                enabled: false,
                period1,
                period2,
            })
        });
        Self::search(EmaParams::default(), candidates, |p| self.backtester.ema(p))
    }

    pub fn optimize_bollinger(&self) -> FamilyOptimum<BollingerParams> {
        let candidates = BB_N_GRID.flat_map(|n| {
            BB_K_TENTHS_GRID.map(move |k| BollingerParams {
                enabled: false,
                n,
                k: f64::from(k) / 10.0,
            })
        });
        Self::search(BollingerParams::default(), candidates, |p| self.backtester.bollinger(p))
    }

    /// Profit of the default Ichimoku periods; there is no grid
    pub fn optimize_ichimoku(&self) -> FamilyOptimum<IchimokuParams> {
        let params = IchimokuParams::default();
        Self::search(params, std::iter::once(params), |p| self.backtester.ichimoku(p))
    }

    pub fn optimize_macd(&self) -> FamilyOptimum<MacdParams> {
        let candidates = MACD_SHORT_GRID.flat_map(|short_period| {
            MACD_LONG_GRID.flat_map(move |long_period| {
                MACD_SIGNAL_GRID.map(move |signal_period| MacdParams {
                    enabled: false,
                    short_period,
                    long_period,
                    signal_period,
                })
            })
        });
        Self::search(MacdParams::default(), candidates, |p| self.backtester.macd(p))
    }

    pub fn optimize_rsi(&self) -> FamilyOptimum<RsiParams> {
        let candidates = RSI_PERIOD_GRID.flat_map(|period| {
            RSI_BUY_GRID.flat_map(move |buy| {
                RSI_SELL_GRID.map(move |sell| RsiParams {
                    enabled: false,
                    period,
                    buy_threshold: f64::from(buy),
                    sell_threshold: f64::from(sell),
                })
            })
        });
        Self::search(RsiParams::default(), candidates, |p| self.backtester.rsi(p))
    }

    /// Optimise every family, rank them and enable the top `num_ranking`
    /// profitable ones. Ichimoku is never enabled.
    pub fn optimize(&self, num_ranking: usize) -> OptimizationReport {
        let mut ema = self.optimize_ema();
        let mut bollinger = self.optimize_bollinger();
        let mut macd = self.optimize_macd();
        let mut rsi = self.optimize_rsi();
        debug!(
            ema = ema.performance,
            bollinger = bollinger.performance,
            macd = macd.performance,
            rsi = rsi.performance,
            "grid search finished"
        );

        let mut rankings: Vec<Ranking> = [
            (IndicatorFamily::Ema, ema.performance),
            (IndicatorFamily::Bollinger, bollinger.performance),
            (IndicatorFamily::Macd, macd.performance),
            (IndicatorFamily::Rsi, rsi.performance),
        ]
        .into_iter()
        .map(|(family, performance)| Ranking::new(family, performance))
        .collect();
        // stable: equal performances keep enumeration order
        rankings.sort_by(|a, b| b.performance.total_cmp(&a.performance));

        for ranking in rankings.iter_mut().take(num_ranking) {
            if ranking.performance > 0.0 {
                ranking.enabled = true;
            }
        }
        let enabled = |family: IndicatorFamily| rankings.iter().any(|r| r.family == family && r.enabled);

        ema.params.enabled = enabled(IndicatorFamily::Ema);
        bollinger.params.enabled = enabled(IndicatorFamily::Bollinger);
        macd.params.enabled = enabled(IndicatorFamily::Macd);
        rsi.params.enabled = enabled(IndicatorFamily::Rsi);

        let params = rankings.iter().any(|r| r.enabled).then(|| TradeParams {
            ema: ema.params,
            bollinger: bollinger.params,
            ichimoku: IchimokuParams::default(),
            macd: macd.params,
            rsi: rsi.params,
        });

        let report = OptimizationReport {
            candles: self.backtester.series().len(),
            rankings,
            params,
        };
        info!(
            candles = report.candles,
            enabled = report.params.map_or(0, |p| p.enabled_count()),
            "parameter optimisation complete"
        );
        report
    }

    /// The enabled parameter set, `None` when no family is profitable
    pub fn optimize_params(&self, num_ranking: usize) -> Option<TradeParams> {
        self.optimize(num_ranking).params
    }
}
