//! Unit tests for engine modules

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use engine::data::{Candle, CandleDuration, CandleSeries};
    use engine::exchange::adjust_size;
    use engine::indicators::{
        calculate_bollinger, calculate_ema, calculate_hv, calculate_macd, calculate_rsi, calculate_sma, Indicator, EMA,
        SMA,
    };
    use engine::portfolio::{Balance, SignalLedger};
    use engine::strategy::{RsiParams, TradeParams};

    #[test]
    fn test_candle_creation() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let candle = Candle::new("BTC_JPY", CandleDuration::Hour, t, 100.0, 110.0, 95.0, 105.0, 1000.0);

        assert_eq!(candle.open, 100.0);
        assert_eq!(candle.high, 110.0);
        assert_eq!(candle.low, 95.0);
        assert_eq!(candle.close, 105.0);
        assert!(candle.is_bullish());
        assert!(!candle.is_bearish());
        assert_eq!(candle.range(), 15.0);
        assert_eq!(candle.body_size(), 5.0);
        assert_eq!(candle.median_price(), 102.5);
    }

    #[test]
    fn test_candle_absorb() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut candle = Candle::new("BTC_JPY", CandleDuration::Minute, t, 100.0, 100.0, 100.0, 100.0, 1.0);
        candle.absorb(90.0, 0.5);
        candle.absorb(95.0, 0.5);

        assert_eq!((candle.high, candle.low, candle.close, candle.volume), (100.0, 90.0, 95.0, 2.0));
        assert_eq!(candle.open, 100.0);
    }

    #[test]
    fn test_series_projections() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let series: CandleSeries = (0..3)
            .map(|i| {
                let p = 10.0 * (i + 1) as f64;
                Candle::new("BTC_JPY", CandleDuration::Minute, t + Duration::minutes(i), p, p + 1.0, p - 1.0, p, 2.0)
            })
            .collect::<Vec<_>>()
            .into();

        assert_eq!(series.closes(), vec![10.0, 20.0, 30.0]);
        assert_eq!(series.highs(), vec![11.0, 21.0, 31.0]);
        assert_eq!(series.lows(), vec![9.0, 19.0, 29.0]);
        assert_eq!(series.volumes(), vec![2.0; 3]);
        assert_eq!(series.last().map(|c| c.time), Some(t + Duration::minutes(2)));
    }

    #[test]
    fn test_sma_ema_known_values() {
        let values = [3.0, 4.0, 5.0, 9.0];
        assert_eq!(calculate_sma(&values, 3), vec![None, None, Some(4.0), Some(6.0)]);
        assert_eq!(calculate_ema(&values, 3), vec![None, None, Some(4.0), Some(6.5)]);
    }

    #[test]
    fn test_streaming_indicators_match_batch() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();

        let mut sma = SMA::new(5).unwrap();
        let mut ema = EMA::new(5).unwrap();
        for v in &values {
            sma.update(*v);
            ema.update(*v);
        }
        assert!(sma.is_ready());
        assert_eq!(sma.name(), "SMA");

        let batch_sma = calculate_sma(&values, 5)[29].unwrap();
        let batch_ema = calculate_ema(&values, 5)[29].unwrap();
        assert!((sma.value().unwrap() - batch_sma).abs() < 1e-9);
        assert!((ema.value().unwrap() - batch_ema).abs() < 1e-9);
    }

    #[test]
    fn test_bollinger_example() {
        let bb = calculate_bollinger(&[3.0, 4.0, 5.0, 6.0], 3, 1.0);
        assert_eq!(bb.upper, vec![None, None, Some(5.0), Some(6.0)]);
        assert_eq!(bb.middle, vec![None, None, Some(4.0), Some(5.0)]);
        assert_eq!(bb.lower, vec![None, None, Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_rsi_example() {
        let rsi = calculate_rsi(&[3.0, 4.0, 5.0, 6.0, 4.0], 3);
        assert!(rsi[..3].iter().all(Option::is_none));
        assert!((rsi[3].unwrap() - 100.0).abs() < 1e-6);
        assert!((rsi[4].unwrap() - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_series_lengths_are_aligned() {
        let values: Vec<f64> = (1..=60).map(f64::from).collect();
        let macd = calculate_macd(&values, 12, 26, 9);

        assert_eq!(macd.macd.len(), values.len());
        assert_eq!(macd.signal.len(), values.len());
        assert_eq!(macd.histogram.len(), values.len());
        assert_eq!(calculate_hv(&values, 21).len(), values.len());
        assert!(macd.macd[24].is_none());
        assert!(macd.macd[25].is_some());
        assert!(macd.signal[32].is_none());
        assert!(macd.signal[33].is_some());
    }

    #[test]
    fn test_ledger_sell_first_fails() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut ledger = SignalLedger::new("BTC_JPY");

        assert!(!ledger.can_sell(t));
        assert!(!ledger.sell(t, 100.0, 1.0));
        assert!(ledger.can_buy(t));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_adjust_size_and_balance() {
        assert_eq!(adjust_size(0.5, 0.0), 0.5);
        assert_eq!(adjust_size(0.99999, 0.0), 0.9999);

        let balance = Balance::new("JPY", 10_000.0, 8_000.0);
        assert!(balance.can_afford(8_000.0));
        assert!(!balance.can_afford(8_000.5));
    }

    #[test]
    fn test_trade_params_defaults() {
        let params = TradeParams::default();
        assert_eq!(params.enabled_count(), 0);
        assert_eq!(params.ema.period1, 7);
        assert_eq!(params.ema.period2, 14);
        assert_eq!(params.bollinger.n, 20);
        assert_eq!(params.macd.short_period, 12);
        assert_eq!(
            params.rsi,
            RsiParams {
                enabled: false,
                period: 14,
                buy_threshold: 30.0,
                sell_threshold: 70.0
            }
        );
        assert!(!params.ichimoku.enabled);
    }
}
