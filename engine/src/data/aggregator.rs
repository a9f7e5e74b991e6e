//! Tick to candle aggregation

use crate::data::{Candle, CandleDuration, CandleStore, Ticker};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Result of folding one tick into its bucket
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// First tick of a new bucket
    Created(Candle),
    /// Tick merged into an existing bucket
    Updated(Candle),
}

impl IngestOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn candle(&self) -> &Candle {
        match self {
            Self::Created(c) | Self::Updated(c) => c,
        }
    }
}

/// Folds ticks into OHLCV candles through a [`CandleStore`]
#[derive(Clone)]
pub struct CandleAggregator {
    store: Arc<dyn CandleStore>,
}

impl CandleAggregator {
    pub fn new(store: Arc<dyn CandleStore>) -> Self {
        Self { store }
    }

    /// Fold a tick into the bucket for `duration` ("1s", "1m", "1h" or "1d").
    pub async fn ingest(&self, tick: &Ticker, product_code: &str, duration: &str) -> Result<IngestOutcome> {
        let duration: CandleDuration = duration.parse()?;
        self.ingest_for(tick, product_code, duration).await
    }

    /// Same as [`ingest`](Self::ingest) with an already parsed duration
    pub async fn ingest_for(
        &self,
        tick: &Ticker,
        product_code: &str,
        duration: CandleDuration,
    ) -> Result<IngestOutcome> {
        let time = duration.truncate(tick.timestamp);
        let price = tick.mid_price();

        match self.store.get_candle(product_code, duration, time).await? {
            None => {
                let candle = Candle::new(product_code, duration, time, price, price, price, price, tick.volume);
                self.store.upsert_candle(&candle).await?;
                debug!(product_code, %duration, %time, price, "candle created");
                Ok(IngestOutcome::Created(candle))
            }
            Some(mut candle) => {
                candle.absorb(price, tick.volume);
                self.store.upsert_candle(&candle).await?;
                Ok(IngestOutcome::Updated(candle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryStore;
    use crate::EngineError;
    use chrono::{Duration, TimeZone, Utc};

    fn tick(second: i64, bid: f64, ask: f64, volume: f64) -> Ticker {
        Ticker {
            product_code: "BTC_JPY".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(second),
            tick_id: second as u64,
            best_bid: bid,
            best_ask: ask,
            best_bid_size: 0.1,
            best_ask_size: 0.1,
            total_bid_depth: 10.0,
            total_ask_depth: 10.0,
            ltp: bid,
            volume,
            volume_by_product: volume,
        }
    }

    #[tokio::test]
    async fn test_first_tick_creates_flat_candle() {
        let agg = CandleAggregator::new(Arc::new(InMemoryStore::new()));

        let outcome = agg.ingest(&tick(5, 99.0, 101.0, 2.0), "BTC_JPY", "1m").await.unwrap();
        assert!(outcome.is_created());
        let c = outcome.candle();
        assert_eq!((c.open, c.high, c.low, c.close, c.volume), (100.0, 100.0, 100.0, 100.0, 2.0));
        assert_eq!(c.time, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_ticks_in_same_bucket_update() {
        let agg = CandleAggregator::new(Arc::new(InMemoryStore::new()));
        let mids = [(10.0, 1.0), (14.0, 0.5), (8.0, 0.25), (11.0, 0.25)];

        let mut last = None;
        for (i, (mid, vol)) in mids.iter().enumerate() {
            last = Some(
                agg.ingest(&tick(i as i64, mid - 1.0, mid + 1.0, *vol), "BTC_JPY", "1m")
                    .await
                    .unwrap(),
            );
        }

        let outcome = last.unwrap();
        assert!(!outcome.is_created());
        let c = outcome.candle();
        assert_eq!(c.open, 10.0);
        assert_eq!(c.high, 14.0);
        assert_eq!(c.low, 8.0);
        assert_eq!(c.close, 11.0);
        assert_eq!(c.volume, 2.0);
    }

    #[tokio::test]
    async fn test_unsupported_duration() {
        let agg = CandleAggregator::new(Arc::new(InMemoryStore::new()));
        let err = agg.ingest(&tick(0, 1.0, 1.0, 1.0), "BTC_JPY", "15m").await.unwrap_err();
        assert_eq!(err, EngineError::InvalidDuration("15m".to_string()));
    }
}
