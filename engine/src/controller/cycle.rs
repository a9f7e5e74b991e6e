//! Trading controller

use crate::backtest::Optimizer;
use crate::config::TradingConfig;
use crate::controller::{wait_until_complete, SingleFlight};
use crate::data::{Candle, CandleSeries, CandleStore, SignalStore};
use crate::exchange::{adjust_size, ExchangeClient, OrderQuery, OrderRequest};
use crate::portfolio::{available_of, LedgerSnapshot, Side, SignalLedger};
use crate::strategy::{RuleSet, TradeParams};
use crate::{EngineError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

/// State owned by the single-flight gate
#[derive(Debug, Clone, Default)]
pub struct CycleState {
    /// Newest candle already acted on
    pub last_processed_time: Option<DateTime<Utc>>,
    /// Loss-cut floor, zero when no position is open
    pub stop_limit: f64,
    pub params: Option<TradeParams>,
}

/// Result of one call to [`Controller::trade`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was in flight; this trigger was dropped
    Busy,
    /// No parameters were available; one re-optimisation was attempted
    NoParams,
    Completed {
        processed: usize,
        buys: usize,
        sells: usize,
    },
}

/// Ties candles, rules, the ledger and the exchange together.
///
/// Only one trading cycle runs at a time; triggers arriving while a cycle is
/// in flight are dropped.
pub struct Controller {
    config: TradingConfig,
    exchange: Arc<dyn ExchangeClient>,
    candles: Arc<dyn CandleStore>,
    signals: Arc<dyn SignalStore>,
    ledger: RwLock<SignalLedger>,
    gate: SingleFlight<CycleState>,
    published: watch::Sender<Option<TradeParams>>,
}

impl Controller {
    pub fn new(
        config: TradingConfig,
        exchange: Arc<dyn ExchangeClient>,
        candles: Arc<dyn CandleStore>,
        signals: Arc<dyn SignalStore>,
    ) -> Self {
        let ledger = SignalLedger::new(config.product_code.clone());
        let (published, _) = watch::channel(None);
        Self {
            config,
            exchange,
            candles,
            signals,
            ledger: RwLock::new(ledger),
            gate: SingleFlight::new(CycleState::default()),
            published,
        }
    }

    pub fn config(&self) -> &TradingConfig {
        &self.config
    }

    /// Seed the ledger and run the initial optimisation.
    ///
    /// Live mode seeds the ledger with the most recent persisted signal;
    /// backtest mode starts empty.
    pub async fn bootstrap(&self) -> Result<()> {
        if !self.config.back_test {
            let seed = self
                .signals
                .latest_signals(&self.config.product_code, 1)
                .await?;
            info!(signals = seed.len(), "ledger seeded from storage");
            *self.ledger.write().await = SignalLedger::from_signals(self.config.product_code.clone(), seed);
        }

        let mut state = self.gate.enter().await;
        self.reoptimize(&mut state).await;
        Ok(())
    }

    /// Parameters currently used by trading cycles
    pub fn current_params(&self) -> Option<TradeParams> {
        *self.published.borrow()
    }

    /// Replace the parameter snapshot, waiting for any running cycle
    pub async fn replace_params(&self, params: Option<TradeParams>) {
        let mut state = self.gate.enter().await;
        state.params = params;
        self.published.send_replace(params);
    }

    pub async fn ledger_snapshot(&self) -> LedgerSnapshot {
        self.ledger.read().await.snapshot()
    }

    /// Signals at or after `time`.
    ///
    /// Live mode reads the persisted history; backtest mode never persists,
    /// so it slices the in-memory ledger.
    pub async fn events_after(&self, time: DateTime<Utc>) -> Result<SignalLedger> {
        if self.config.back_test {
            return Ok(self.ledger.read().await.collect_after(time));
        }
        let signals = self
            .signals
            .signals_after(&self.config.product_code, time)
            .await?;
        Ok(SignalLedger::from_signals(self.config.product_code.clone(), signals))
    }

    /// Loss-cut floor of the last finished cycle, `None` while one runs
    pub fn stop_limit(&self) -> Option<f64> {
        self.gate.try_enter().map(|state| state.stop_limit)
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    /// Run one cycle in the background
    pub fn trigger(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            match controller.trade().await {
                Ok(outcome) => debug!(?outcome, "trading cycle finished"),
                Err(e) => error!(error = %e, "trading cycle failed"),
            }
        });
    }

    /// Run one trading cycle unless another one is in flight.
    pub async fn trade(&self) -> Result<CycleOutcome> {
        let Some(mut state) = self.gate.try_enter() else {
            debug!("trading cycle already running, trigger dropped");
            return Ok(CycleOutcome::Busy);
        };

        let Some(params) = state.params else {
            error!("optimized params not found");
            self.reoptimize(&mut state).await;
            return Ok(CycleOutcome::NoParams);
        };

        let series = self.latest_series().await?;
        let rules = RuleSet::build(&params, &series);
        debug!(
            candles = series.len(),
            families = ?rules.families(),
            "trading cycle started"
        );

        let mut outcome = (0, 0, 0);
        for (i, candle) in series.candles().iter().enumerate() {
            if state.last_processed_time.is_some_and(|t| candle.time <= t) {
                continue;
            }
            outcome.0 += 1;

            let tally = rules.tally(i);
            if !tally.votes.is_empty() {
                info!(time = %candle.time, close = candle.close, votes = %tally.to_json(), "indicator votes");
            }

            if tally.buys > 0 {
                if !self.buy(candle).await {
                    continue;
                }
                outcome.1 += 1;
                state.stop_limit = candle.close * self.config.stop_limit_percent;
                info!(close = candle.close, stop_limit = state.stop_limit, "position opened");
            }

            if tally.sells > 0 || candle.close < state.stop_limit {
                if tally.sells == 0 {
                    info!(close = candle.close, stop_limit = state.stop_limit, "loss cut");
                }
                if !self.sell(candle).await {
                    continue;
                }
                outcome.2 += 1;
                state.stop_limit = 0.0;
                self.reoptimize(&mut state).await;
            }
        }

        if let Some(last) = series.last() {
            state.last_processed_time = Some(last.time);
        }

        let (processed, buys, sells) = outcome;
        Ok(CycleOutcome::Completed {
            processed,
            buys,
            sells,
        })
    }

    async fn latest_series(&self) -> Result<CandleSeries> {
        let candles = self
            .candles
            .latest_candles(
                &self.config.product_code,
                self.config.trade_duration,
                self.config.data_limit,
            )
            .await?;
        Ok(CandleSeries::from_vec(candles))
    }

    /// Grid-search fresh parameters off the async runtime. Keeps the old
    /// snapshot when candles cannot be read.
    async fn reoptimize(&self, state: &mut CycleState) {
        let series = match self.latest_series().await {
            Ok(series) => series,
            Err(e) => {
                warn!(error = %e, "cannot load candles for optimisation");
                return;
            }
        };

        let size = self.config.backtest_size;
        let num_ranking = self.config.num_ranking;
        let report = match tokio::task::spawn_blocking(move || Optimizer::new(&series, size).optimize(num_ranking)).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "optimisation task failed");
                return;
            }
        };
        debug!("{}", report.format());
        if report.params.is_none() {
            warn!("no trade configuration available");
        }

        state.params = report.params;
        self.published.send_replace(report.params);
    }

    /// Buy at `candle`; `true` once the fill is recorded in the ledger
    pub async fn buy(&self, candle: &Candle) -> bool {
        if self.config.back_test {
            return self
                .ledger
                .write()
                .await
                .buy(candle.time, candle.close, self.config.backtest_size);
        }
        if candle.time < self.config.start_time || !self.ledger.read().await.can_buy(candle.time) {
            return false;
        }
        self.settle(Side::Buy, candle, self.buy_size().await).await
    }

    /// Sell at `candle`; `true` once the fill is recorded in the ledger
    pub async fn sell(&self, candle: &Candle) -> bool {
        if self.config.back_test {
            return self
                .ledger
                .write()
                .await
                .sell(candle.time, candle.close, self.config.backtest_size);
        }
        if candle.time < self.config.start_time || !self.ledger.read().await.can_sell(candle.time) {
            return false;
        }
        self.settle(Side::Sell, candle, self.sell_size().await).await
    }

    async fn buy_size(&self) -> Result<f64> {
        let (_, currency) = self.config.currencies();
        let balances = self.exchange.get_balance().await?;
        let budget = available_of(&balances, currency) * self.config.use_percent;
        let ticker = self.exchange.get_ticker(&self.config.product_code).await?;
        if ticker.best_ask <= 0.0 {
            return Err(EngineError::MalformedExchangeResponse(format!(
                "best ask {}",
                ticker.best_ask
            )));
        }
        Ok(adjust_size(budget / ticker.best_ask, self.config.fee_rate))
    }

    async fn sell_size(&self) -> Result<f64> {
        let (coin, _) = self.config.currencies();
        let balances = self.exchange.get_balance().await?;
        let held = balances
            .iter()
            .find(|b| b.currency_code == coin)
            .map_or(0.0, |b| b.amount);
        Ok(adjust_size(held, self.config.fee_rate))
    }

    async fn settle(&self, side: Side, candle: &Candle, size: Result<f64>) -> bool {
        let result = match size {
            Ok(size) => self.execute(side, candle, size).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(recorded) => recorded,
            Err(e) => {
                warn!(%side, time = %candle.time, error = %e, "order not completed");
                false
            }
        }
    }

    /// Send a market order, wait for it to complete and record the fill
    async fn execute(&self, side: Side, candle: &Candle, size: f64) -> Result<bool> {
        if size <= 0.0 {
            warn!(%side, size, "order size too small");
            return Ok(false);
        }

        let order = OrderRequest::market(
            self.config.product_code.clone(),
            side,
            size,
            self.config.order_expire_minutes,
        );
        let acceptance_id = self.exchange.send_order(&order).await?;
        if acceptance_id.is_empty() {
            return Err(EngineError::OrderSubmissionFailed(format!("{:?}", order)));
        }
        info!(%side, size, acceptance_id = %acceptance_id, "order sent");

        let query = OrderQuery {
            product_code: self.config.product_code.clone(),
            acceptance_id: acceptance_id.clone(),
        };
        let filled = wait_until_complete(
            self.exchange.as_ref(),
            &query,
            self.config.poll_expiry,
            self.config.poll_interval,
        )
        .await?
        .ok_or(EngineError::OrderNotConfirmed(acceptance_id))?;

        let recorded = self
            .ledger
            .write()
            .await
            .record(
                side,
                candle.time,
                filled.average_price,
                filled.size,
                Some(self.signals.as_ref()),
            )
            .await?;
        if recorded {
            info!(%side, price = filled.average_price, size = filled.size, "fill recorded");
        } else {
            warn!(%side, order = ?filled, "{}", EngineError::LedgerRejected);
        }
        Ok(recorded)
    }
}
