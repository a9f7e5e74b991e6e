//! Candle and signal persistence boundary

use crate::data::{Candle, CandleDuration};
use crate::portfolio::SignalEvent;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Candle persistence, keyed by (product code, duration, bucket time)
#[async_trait]
pub trait CandleStore: Send + Sync {
    async fn get_candle(
        &self,
        product_code: &str,
        duration: CandleDuration,
        time: DateTime<Utc>,
    ) -> Result<Option<Candle>>;

    /// Insert or overwrite the candle at its bucket key
    async fn upsert_candle(&self, candle: &Candle) -> Result<()>;

    /// The most recent `limit` candles, oldest first
    async fn latest_candles(
        &self,
        product_code: &str,
        duration: CandleDuration,
        limit: usize,
    ) -> Result<Vec<Candle>>;
}

/// Signal persistence
#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn append_signal(&self, event: &SignalEvent) -> Result<()>;

    /// The most recent `limit` signals, oldest first
    async fn latest_signals(&self, product_code: &str, limit: usize) -> Result<Vec<SignalEvent>>;

    /// Signals at or after `time`, oldest first
    async fn signals_after(&self, product_code: &str, time: DateTime<Utc>) -> Result<Vec<SignalEvent>>;
}

/// In-memory store used for backtest mode and tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    candles: RwLock<HashMap<String, BTreeMap<DateTime<Utc>, Candle>>>,
    signals: RwLock<Vec<SignalEvent>>,
}

impl InMemoryStore {
    /// Create new storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Get storage key from product code and duration
    fn key(product_code: &str, duration: CandleDuration) -> String {
        format!("{}:{}", product_code, duration)
    }

    /// Bulk-load candles, e.g. historical bars for a backtest
    pub async fn load_candles(&self, candles: impl IntoIterator<Item = Candle>) {
        let mut map = self.candles.write().await;
        for candle in candles {
            map.entry(Self::key(&candle.product_code, candle.duration))
                .or_default()
                .insert(candle.time, candle);
        }
    }

    /// Number of stored candles for one series
    pub async fn candle_count(&self, product_code: &str, duration: CandleDuration) -> usize {
        self.candles
            .read()
            .await
            .get(&Self::key(product_code, duration))
            .map_or(0, BTreeMap::len)
    }

    /// All stored signals in insertion order
    pub async fn signals(&self) -> Vec<SignalEvent> {
        self.signals.read().await.clone()
    }
}

#[async_trait]
impl CandleStore for InMemoryStore {
    async fn get_candle(
        &self,
        product_code: &str,
        duration: CandleDuration,
        time: DateTime<Utc>,
    ) -> Result<Option<Candle>> {
        Ok(self
            .candles
            .read()
            .await
            .get(&Self::key(product_code, duration))
            .and_then(|series| series.get(&time))
            .cloned())
    }

    async fn upsert_candle(&self, candle: &Candle) -> Result<()> {
        self.candles
            .write()
            .await
            .entry(Self::key(&candle.product_code, candle.duration))
            .or_default()
            .insert(candle.time, candle.clone());
        Ok(())
    }

    async fn latest_candles(
        &self,
        product_code: &str,
        duration: CandleDuration,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let map = self.candles.read().await;
        let Some(series) = map.get(&Self::key(product_code, duration)) else {
            return Ok(Vec::new());
        };
        let mut latest: Vec<Candle> = series.values().rev().take(limit).cloned().collect();
        latest.reverse();
        Ok(latest)
    }
}

#[async_trait]
impl SignalStore for InMemoryStore {
    async fn append_signal(&self, event: &SignalEvent) -> Result<()> {
        self.signals.write().await.push(event.clone());
        Ok(())
    }

    async fn latest_signals(&self, product_code: &str, limit: usize) -> Result<Vec<SignalEvent>> {
        let signals = self.signals.read().await;
        let mut latest: Vec<SignalEvent> = signals
            .iter()
            .rev()
            .filter(|s| s.product_code == product_code)
            .take(limit)
            .cloned()
            .collect();
        latest.reverse();
        Ok(latest)
    }

    async fn signals_after(&self, product_code: &str, time: DateTime<Utc>) -> Result<Vec<SignalEvent>> {
        Ok(self
            .signals
            .read()
            .await
            .iter()
            .filter(|s| s.product_code == product_code && s.time >= time)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar(minute: i64, close: f64) -> Candle {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Candle::new("BTC_JPY", CandleDuration::Minute, t0 + Duration::minutes(minute), close, close, close, close, 1.0)
    }

    #[tokio::test]
    async fn test_latest_candles_ascending_and_limited() {
        let store = InMemoryStore::new();
        store.load_candles((0..10).map(|m| bar(m, m as f64))).await;

        let latest = store
            .latest_candles("BTC_JPY", CandleDuration::Minute, 3)
            .await
            .unwrap();
        let closes: Vec<f64> = latest.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![7.0, 8.0, 9.0]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_bucket() {
        let store = InMemoryStore::new();
        store.upsert_candle(&bar(0, 1.0)).await.unwrap();
        store.upsert_candle(&bar(0, 2.0)).await.unwrap();

        assert_eq!(store.candle_count("BTC_JPY", CandleDuration::Minute).await, 1);
        let stored = store
            .get_candle("BTC_JPY", CandleDuration::Minute, bar(0, 0.0).time)
            .await
            .unwrap();
        assert_eq!(stored.map(|c| c.close), Some(2.0));
    }
}
