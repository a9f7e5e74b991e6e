//! Order completion polling

use crate::exchange::{ExchangeClient, Order, OrderQuery};
use crate::Result;
use std::time::Duration;
use tokio::time::{interval_at, sleep_until, timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Poll the exchange every `interval` until the order completes or `expiry`
/// elapses.
///
/// The first check happens one interval after submission. Returns the
/// completed order, or `None` once the deadline passes; the remaining
/// interval is not waited out, nor is a status query still in flight at the
/// deadline. Failed status queries are logged and retried on the next tick.
pub async fn wait_until_complete(
    exchange: &dyn ExchangeClient,
    query: &OrderQuery,
    expiry: Duration,
    interval: Duration,
) -> Result<Option<Order>> {
    let start = Instant::now();
    let deadline = sleep_until(start + expiry);
    tokio::pin!(deadline);
    let mut ticker = interval_at(start + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut deadline => {
                info!(acceptance_id = %query.acceptance_id, "order not completed before expiry");
                return Ok(None);
            }
            _ = ticker.tick() => {
                let Ok(listed) = timeout_at(start + expiry, exchange.list_orders(query)).await else {
                    info!(acceptance_id = %query.acceptance_id, "order status query outlived expiry");
                    return Ok(None);
                };
                match listed {
                    Ok(orders) => match orders.into_iter().next() {
                        Some(order) if order.is_completed() => return Ok(Some(order)),
                        Some(order) => debug!(acceptance_id = %query.acceptance_id, state = ?order.state, "order pending"),
                        None => info!(acceptance_id = %query.acceptance_id, "order list is empty"),
                    },
                    Err(e) => warn!(acceptance_id = %query.acceptance_id, error = %e, "order status query failed"),
                }
            }
        }
    }
}
