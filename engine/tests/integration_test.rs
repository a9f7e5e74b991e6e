//! Integration tests for the engine pipeline

use chrono::{DateTime, Duration, TimeZone, Utc};
use engine::backtest::{Backtester, Optimizer, EMA_PERIOD1_GRID, EMA_PERIOD2_GRID};
use engine::config::TradingConfig;
use engine::controller::{Controller, CycleOutcome};
use engine::data::{Candle, CandleAggregator, CandleDuration, CandleSeries, CandleStore, InMemoryStore, SignalStore, Ticker};
use engine::exchange::{ExchangeClient, Order, OrderQuery, OrderRequest};
use engine::ingest::run_ingestion;
use engine::portfolio::{Balance, Side, SignalEvent, SignalLedger};
use engine::strategy::{EmaParams, RsiParams, TradeParams};
use engine::{EngineError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Helper function to create test candles from close prices
fn create_test_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Candle::new(
                "BTC_JPY",
                CandleDuration::Minute,
                base_time() + Duration::minutes(i as i64),
                c,
                c + 1.0,
                c - 1.0,
                c,
                1.0,
            )
        })
        .collect()
}

/// A choppy series with enough swings for every rule to trade
fn wave(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            1_000.0 + 40.0 * (x / 6.0).sin() + 15.0 * (x / 2.3).cos() + x * 0.3
        })
        .collect()
}

fn tick(at: DateTime<Utc>, mid: f64) -> Ticker {
    Ticker {
        product_code: "BTC_JPY".to_string(),
        timestamp: at,
        tick_id: at.timestamp() as u64,
        best_bid: mid - 0.5,
        best_ask: mid + 0.5,
        best_bid_size: 1.0,
        best_ask_size: 1.0,
        total_bid_depth: 100.0,
        total_ask_depth: 100.0,
        ltp: mid,
        volume: 1.0,
        volume_by_product: 1.0,
    }
}

/// Exchange that must never be reached
struct OfflineExchange;

#[async_trait::async_trait]
impl ExchangeClient for OfflineExchange {
    async fn get_balance(&self) -> Result<Vec<Balance>> {
        Err(EngineError::Exchange("offline".to_string()))
    }

    async fn get_ticker(&self, _product_code: &str) -> Result<Ticker> {
        Err(EngineError::Exchange("offline".to_string()))
    }

    async fn send_order(&self, _order: &OrderRequest) -> Result<String> {
        Err(EngineError::Exchange("offline".to_string()))
    }

    async fn list_orders(&self, _query: &OrderQuery) -> Result<Vec<Order>> {
        Err(EngineError::Exchange("offline".to_string()))
    }

    async fn stream_ticks(&self, _product_code: &str) -> Result<mpsc::Receiver<Ticker>> {
        Err(EngineError::Exchange("offline".to_string()))
    }
}

fn backtest_config() -> TradingConfig {
    TradingConfig {
        back_test: true,
        durations: vec![CandleDuration::Second, CandleDuration::Minute],
        ..TradingConfig::default()
    }
}

#[tokio::test]
async fn test_ingest_properties_over_many_ticks() {
    let store = Arc::new(InMemoryStore::new());
    let aggregator = CandleAggregator::new(store.clone());
    let mids = [101.0, 99.5, 104.0, 98.0, 100.0, 103.5];

    for (i, mid) in mids.iter().enumerate() {
        aggregator
            .ingest(&tick(base_time() + Duration::seconds(i as i64 * 7), *mid), "BTC_JPY", "1m")
            .await
            .unwrap();
    }

    let candle = store
        .get_candle("BTC_JPY", CandleDuration::Minute, base_time())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(candle.open, 101.0);
    assert!(mids.iter().all(|m| candle.high >= *m && candle.low <= *m));
    assert_eq!(candle.high, 104.0);
    assert_eq!(candle.low, 98.0);
    assert_eq!(candle.close, 103.5);
    assert_eq!(candle.volume, mids.len() as f64);
}

#[tokio::test]
async fn test_new_bucket_creates_new_candle() {
    let store = Arc::new(InMemoryStore::new());
    let aggregator = CandleAggregator::new(store.clone());

    let first = aggregator.ingest(&tick(base_time() + Duration::seconds(59), 10.0), "BTC_JPY", "1m").await.unwrap();
    let second = aggregator.ingest(&tick(base_time() + Duration::seconds(60), 20.0), "BTC_JPY", "1m").await.unwrap();

    assert!(first.is_created());
    assert!(second.is_created());
    assert_eq!(second.candle().open, 20.0);
    assert_eq!(store.candle_count("BTC_JPY", CandleDuration::Minute).await, 2);
}

#[test]
fn test_optimizer_is_deterministic() {
    let series = CandleSeries::from_vec(create_test_candles(&wave(240)));

    let first = Optimizer::new(&series, 1.0).optimize_ema();
    let second = Optimizer::new(&series, 1.0).optimize_ema();
    assert_eq!(first, second);

    let report_a = Optimizer::new(&series, 1.0).optimize(2);
    let report_b = Optimizer::new(&series, 1.0).optimize(2);
    assert_eq!(report_a, report_b);
}

#[test]
fn test_optimizer_enables_at_most_num_ranking() {
    let series = CandleSeries::from_vec(create_test_candles(&wave(240)));
    let report = Optimizer::new(&series, 1.0).optimize(1);

    let enabled = report.rankings.iter().filter(|r| r.enabled).count();
    assert!(enabled <= 1);
    assert!(report
        .rankings
        .windows(2)
        .all(|w| w[0].performance >= w[1].performance));
    if let Some(params) = report.params {
        assert_eq!(params.enabled_count(), enabled);
        assert!(!params.ichimoku.enabled);
    }
}

#[test]
fn test_optimum_beats_every_grid_point() {
    let series = CandleSeries::from_vec(create_test_candles(&wave(240)));
    let optimum = Optimizer::new(&series, 1.0).optimize_ema();
    let backtester = Backtester::new(&series, 1.0);

    for period1 in EMA_PERIOD1_GRID {
        for period2 in EMA_PERIOD2_GRID {
            let ledger = backtester
                .ema(&EmaParams {
                    enabled: false,
                    period1,
                    period2,
                })
                .unwrap();
            assert!(ledger.profit() <= optimum.performance);
        }
    }
}

#[test]
fn test_profit_replay_is_idempotent() {
    let series = CandleSeries::from_vec(create_test_candles(&wave(240)));
    let params = RsiParams {
        enabled: true,
        period: 10,
        buy_threshold: 30.0,
        sell_threshold: 70.0,
    };
    let ledger = Backtester::new(&series, 1.0).rsi(&params).unwrap();

    let mut replay = SignalLedger::new("BTC_JPY");
    for event in ledger.signals() {
        let accepted = match event.side {
            Side::Buy => replay.buy(event.time, event.price, event.size),
            Side::Sell => replay.sell(event.time, event.price, event.size),
        };
        assert!(accepted);
    }
    assert_eq!(replay.profit(), ledger.profit());
}

#[tokio::test]
async fn test_backtest_mode_records_at_close() {
    let store = Arc::new(InMemoryStore::new());
    store.load_candles(create_test_candles(&wave(240))).await;
    let controller = Controller::new(backtest_config(), Arc::new(OfflineExchange), store.clone(), store.clone());
    let rsi = RsiParams {
        enabled: true,
        period: 10,
        buy_threshold: 30.0,
        sell_threshold: 70.0,
    };

    controller
        .replace_params(Some(TradeParams {
            rsi,
            ..TradeParams::default()
        }))
        .await;

    let outcome = controller.trade().await.unwrap();
    let CycleOutcome::Completed { processed, buys, .. } = outcome else {
        panic!("unexpected outcome {:?}", outcome);
    };
    assert_eq!(processed, 240);
    assert!(buys > 0);

    let snapshot = controller.ledger_snapshot().await;
    let series = CandleSeries::from_vec(create_test_candles(&wave(240)));
    let replayed = Backtester::new(&series, 1.0).rsi(&rsi).unwrap();
    assert_eq!(snapshot.signals, replayed.signals());
    for pair in snapshot.signals.windows(2) {
        assert_ne!(pair[0].side, pair[1].side);
        assert!(pair[0].time < pair[1].time);
    }
    let closes = wave(240);
    for event in &snapshot.signals {
        let i = (event.time - base_time()).num_minutes() as usize;
        assert_eq!(event.price, closes[i]);
        assert_eq!(event.size, 1.0);
    }
    // nothing is persisted in backtest mode
    assert!(store.signals().await.is_empty());

    // chart events slice the in-memory ledger
    let last = snapshot.signals.len() - 1;
    let events = controller.events_after(snapshot.signals[last].time).await.unwrap();
    assert_eq!(events.signals(), &snapshot.signals[last..]);

    // already processed bars are not acted on again
    assert_eq!(
        controller.trade().await.unwrap(),
        CycleOutcome::Completed {
            processed: 0,
            buys: 0,
            sells: 0
        }
    );
}

#[tokio::test]
async fn test_missing_params_triggers_reoptimisation() {
    let store = Arc::new(InMemoryStore::new());
    store.load_candles(create_test_candles(&wave(240))).await;
    let controller = Controller::new(backtest_config(), Arc::new(OfflineExchange), store.clone(), store);

    assert_eq!(controller.current_params(), None);
    assert_eq!(controller.trade().await.unwrap(), CycleOutcome::NoParams);

    let expected = CandleSeries::from_vec(create_test_candles(&wave(240)));
    let expected = Optimizer::new(&expected, 1.0).optimize_params(2);
    assert_eq!(controller.current_params(), expected);
}

#[tokio::test]
async fn test_bootstrap_seeds_ledger_in_live_mode() {
    let store = Arc::new(InMemoryStore::new());
    for (i, side) in [Side::Buy, Side::Sell, Side::Buy].into_iter().enumerate() {
        store
            .append_signal(&SignalEvent {
                time: base_time() + Duration::minutes(i as i64),
                product_code: "BTC_JPY".to_string(),
                side,
                price: 100.0,
                size: 0.1,
            })
            .await
            .unwrap();
    }
    let config = TradingConfig {
        back_test: false,
        ..TradingConfig::default()
    };
    let controller = Controller::new(config, Arc::new(OfflineExchange), store.clone(), store);

    controller.bootstrap().await.unwrap();

    let snapshot = controller.ledger_snapshot().await;
    assert_eq!(snapshot.signals.len(), 1);
    assert_eq!(snapshot.signals[0].side, Side::Buy);
    // no candles: nothing to optimise
    assert_eq!(controller.current_params(), None);

    // chart events come from the persisted history, not the seeded ledger
    let events = controller.events_after(base_time()).await.unwrap();
    assert_eq!(events.signals().len(), 3);
    assert_eq!(events.signals()[0].side, Side::Buy);
    let events = controller.events_after(base_time() + Duration::minutes(1)).await.unwrap();
    assert_eq!(events.signals().len(), 2);
    assert_eq!(events.signals()[0].side, Side::Sell);
}

#[tokio::test]
async fn test_ingestion_builds_every_duration() {
    let store = Arc::new(InMemoryStore::new());
    let controller = Arc::new(Controller::new(
        backtest_config(),
        Arc::new(OfflineExchange),
        store.clone(),
        store.clone(),
    ));
    let (tx, rx) = mpsc::channel(16);

    for secs in [0, 0, 1, 59, 60, 61] {
        tx.send(tick(base_time() + Duration::seconds(secs), 100.0 + secs as f64))
            .await
            .unwrap();
    }
    drop(tx);

    run_ingestion(rx, CandleAggregator::new(store.clone()), controller).await;

    assert_eq!(store.candle_count("BTC_JPY", CandleDuration::Second).await, 5);
    assert_eq!(store.candle_count("BTC_JPY", CandleDuration::Minute).await, 2);
    assert_eq!(store.candle_count("BTC_JPY", CandleDuration::Hour).await, 0);
}
