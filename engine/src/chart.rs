//! On-demand indicator overlays for chart clients

use crate::data::{Candle, CandleDuration, CandleSeries};
use crate::indicators::{
    calculate_bollinger, calculate_ema, calculate_hv, calculate_ichimoku, calculate_macd, calculate_rsi,
    calculate_sma, IchimokuCloud, IchimokuPeriods, MacdSeries,
};
use crate::portfolio::{LedgerSnapshot, SignalLedger};
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use tracing::error;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;
pub const DEFAULT_SMA_PERIODS: [usize; 3] = [7, 14, 50];
pub const DEFAULT_EMA_PERIODS: [usize; 3] = [7, 14, 50];
pub const DEFAULT_BB_N: usize = 20;
pub const DEFAULT_BB_K: f64 = 2.0;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_MACD_PERIODS: [usize; 3] = [12, 26, 9];
pub const DEFAULT_HV_PERIODS: [usize; 3] = [21, 63, 252];

/// Overlays requested by a chart client
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub product_code: String,
    pub duration: CandleDuration,
    pub limit: usize,
    pub events: bool,
    pub sma: Option<[usize; 3]>,
    pub ema: Option<[usize; 3]>,
    pub bollinger: Option<(usize, f64)>,
    pub ichimoku: Option<IchimokuPeriods>,
    pub rsi: Option<usize>,
    pub macd: Option<[usize; 3]>,
    pub hv: Option<[usize; 3]>,
}

/// Positive integer or the default
fn period_or(raw: Option<&String>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map_or(default, |v| v as usize)
}

fn periods_or<const N: usize>(query: &HashMap<String, String>, prefix: &str, defaults: [usize; N]) -> [usize; N] {
    let mut out = defaults;
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = period_or(query.get(&format!("{}{}", prefix, i + 1)), defaults[i]);
    }
    out
}

fn parse_limit(raw: Option<&String>) -> usize {
    match raw {
        None => DEFAULT_LIMIT,
        Some(s) => match s.trim().parse::<i64>() {
            Ok(v) if (0..=MAX_LIMIT as i64).contains(&v) => v as usize,
            _ => MAX_LIMIT,
        },
    }
}

impl ChartRequest {
    /// Parse raw query parameters. A toggle is on when its key is present
    /// and non-empty; invalid or non-positive numbers fall back to defaults.
    pub fn from_query(
        query: &HashMap<String, String>,
        default_product: &str,
        default_duration: CandleDuration,
    ) -> Result<Self> {
        let on = |key: &str| query.get(key).is_some_and(|v| !v.is_empty());

        let duration = match query.get("duration") {
            Some(raw) => raw.parse()?,
            None => default_duration,
        };

        let bollinger = on("bbands").then(|| {
            let n = period_or(query.get("bbands_n"), DEFAULT_BB_N);
            let k = query
                .get("bbands_k")
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|k| *k > 0.0)
                .unwrap_or(DEFAULT_BB_K);
            (n, k)
        });

        let ichimoku = on("ichimoku").then(|| {
            let d = IchimokuPeriods::default();
            IchimokuPeriods {
                tenkan: period_or(query.get("ichimoku_tenkan_period"), d.tenkan),
                base: period_or(query.get("ichimoku_base_period"), d.base),
                pre1_shift: period_or(query.get("ichimoku_pre1_shift"), d.pre1_shift),
                pre2: period_or(query.get("ichimoku_pre2_period"), d.pre2),
                delay: period_or(query.get("ichimoku_delay_period"), d.delay),
            }
        });

        let macd = on("macd").then(|| {
            [
                period_or(query.get("macd_short_period"), DEFAULT_MACD_PERIODS[0]),
                period_or(query.get("macd_long_period"), DEFAULT_MACD_PERIODS[1]),
                period_or(query.get("macd_signal_period"), DEFAULT_MACD_PERIODS[2]),
            ]
        });

        Ok(Self {
            product_code: query
                .get("product_code")
                .cloned()
                .unwrap_or_else(|| default_product.to_string()),
            duration,
            limit: parse_limit(query.get("limit")),
            events: on("events"),
            sma: on("sma").then(|| periods_or(query, "sma_period", DEFAULT_SMA_PERIODS)),
            ema: on("ema").then(|| periods_or(query, "ema_period", DEFAULT_EMA_PERIODS)),
            bollinger,
            ichimoku,
            rsi: on("rsi").then(|| period_or(query.get("rsi_period"), DEFAULT_RSI_PERIOD)),
            macd,
            hv: on("hv").then(|| periods_or(query, "hv_period", DEFAULT_HV_PERIODS)),
        })
    }
}

/// One indicator line and its period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSeries {
    pub period: usize,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerOverlay {
    pub n: usize,
    pub k: f64,
    pub up: Vec<Option<f64>>,
    pub mid: Vec<Option<f64>>,
    pub down: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IchimokuOverlay {
    pub periods: IchimokuPeriods,
    #[serde(flatten)]
    pub cloud: IchimokuCloud,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdOverlay {
    pub short_period: usize,
    pub long_period: usize,
    pub signal_period: usize,
    #[serde(flatten)]
    pub series: MacdSeries,
}

/// Candles plus the requested overlays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub product_code: String,
    pub duration: CandleDuration,
    pub candles: Vec<Candle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<LedgerSnapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub smas: Vec<PeriodSeries>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emas: Vec<PeriodSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbands: Option<BollingerOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ichimoku: Option<IchimokuOverlay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<PeriodSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdOverlay>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hvs: Vec<PeriodSeries>,
}

impl ChartFrame {
    /// Build the frame. An overlay is only added when the series is longer
    /// than its period.
    pub fn build(request: &ChartRequest, series: &CandleSeries, events: Option<SignalLedger>) -> Self {
        let len = series.len();
        let closes = series.closes();
        let lines = |periods: Option<[usize; 3]>, f: fn(&[f64], usize) -> Vec<Option<f64>>| {
            periods
                .into_iter()
                .flatten()
                .filter(|p| len > *p)
                .map(|period| PeriodSeries {
                    period,
                    values: f(&closes, period),
                })
                .collect::<Vec<_>>()
        };

        let bbands = request.bollinger.filter(|(n, _)| len > *n).map(|(n, k)| {
            let bands = calculate_bollinger(&closes, n, k);
            BollingerOverlay {
                n,
                k,
                up: bands.upper,
                mid: bands.middle,
                down: bands.lower,
            }
        });

        let ichimoku = request
            .ichimoku
            .filter(|p| len > p.tenkan.max(p.base).max(p.pre2).max(p.delay))
            .map(|periods| IchimokuOverlay {
                periods,
                cloud: calculate_ichimoku(&series.highs(), &series.lows(), &closes, periods),
            });

        let rsi = request.rsi.filter(|p| len > *p).map(|period| PeriodSeries {
            period,
            values: calculate_rsi(&closes, period),
        });

        let macd = request.macd.and_then(|[short, long, signal]| {
            if short >= long {
                error!(short, long, "macd short period must be shorter than long period");
                return None;
            }
            (len > long.max(signal)).then(|| MacdOverlay {
                short_period: short,
                long_period: long,
                signal_period: signal,
                series: calculate_macd(&closes, short, long, signal),
            })
        });

        Self {
            product_code: request.product_code.clone(),
            duration: request.duration,
            candles: series.candles().to_vec(),
            events: events.map(|ledger| ledger.snapshot()),
            smas: lines(request.sma, calculate_sma),
            emas: lines(request.ema, calculate_ema),
            bbands,
            ichimoku,
            rsi,
            macd,
            hvs: lines(request.hv, calculate_hv),
        }
    }
}
