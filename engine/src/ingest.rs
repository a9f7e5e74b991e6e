//! Tick ingestion loop

use crate::controller::Controller;
use crate::data::{CandleAggregator, Ticker};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Fold every tick into each configured duration and trigger a trading
/// cycle whenever a bar of the trade duration is created.
///
/// Runs until the tick stream closes. Ingestion errors are logged and the
/// tick is skipped for that duration.
pub async fn run_ingestion(
    mut ticks: mpsc::Receiver<Ticker>,
    aggregator: CandleAggregator,
    controller: Arc<Controller>,
) {
    let config = controller.config().clone();
    info!(
        product_code = %config.product_code,
        trade_duration = %config.trade_duration,
        "tick ingestion started"
    );

    while let Some(tick) = ticks.recv().await {
        for &duration in &config.durations {
            match aggregator.ingest_for(&tick, &config.product_code, duration).await {
                Ok(outcome) if outcome.is_created() && duration == config.trade_duration => {
                    controller.trigger();
                }
                Ok(_) => {}
                Err(e) => warn!(%duration, tick_id = tick.tick_id, error = %e, "tick ingestion failed"),
            }
        }
    }

    info!("tick stream closed");
}
