//! OHLCV candle data structures

use crate::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bucket size of a candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CandleDuration {
    #[serde(rename = "1s")]
    Second,
    #[serde(rename = "1m")]
    Minute,
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "1d")]
    Day,
}

impl CandleDuration {
    /// All supported durations, finest first
    pub const ALL: [CandleDuration; 4] = [Self::Second, Self::Minute, Self::Hour, Self::Day];

    /// Short code used in configuration and storage keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "1s",
            Self::Minute => "1m",
            Self::Hour => "1h",
            Self::Day => "1d",
        }
    }

    /// Length of one bucket in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }

    /// Truncate a timestamp to the start of its bucket.
    ///
    /// All fields finer than the bucket size are zeroed.
    pub fn truncate(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        let secs = time.timestamp();
        let floored = secs - secs.rem_euclid(self.seconds());
        DateTime::from_timestamp(floored, 0).unwrap_or(time)
    }
}

impl fmt::Display for CandleDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CandleDuration {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1s" => Ok(Self::Second),
            "1m" => Ok(Self::Minute),
            "1h" => Ok(Self::Hour),
            "1d" => Ok(Self::Day),
            other => Err(EngineError::InvalidDuration(other.to_string())),
        }
    }
}

/// OHLCV candle data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Instrument (e.g., "BTC_JPY")
    pub product_code: String,
    /// Bucket size
    pub duration: CandleDuration,
    /// Bucket start, UTC
    pub time: DateTime<Utc>,
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

impl Candle {
    /// Create a new candle
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_code: impl Into<String>,
        duration: CandleDuration,
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            duration,
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Fold one more price observation into the bar
    pub fn absorb(&mut self, price: f64, volume: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += volume;
    }

    /// Get median price (HL/2)
    pub fn median_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Check if candle is bullish
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Check if candle is bearish
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Get body size (absolute difference between open and close)
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Get total range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Time-ordered candles of one instrument and duration, oldest first.
///
/// Projections are computed on every call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Create new empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from vector of candles, sorting them oldest first
    pub fn from_vec(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.time);
        Self { candles }
    }

    /// Add a candle
    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }

    /// Get number of candles
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Get candle at index
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Get first candle
    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    /// Get last candle
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Get all candles
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Get close prices as vector
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Get high prices as vector
    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    /// Get low prices as vector
    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    /// Get volumes as vector
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

impl From<Vec<Candle>> for CandleSeries {
    fn from(candles: Vec<Candle>) -> Self {
        Self::from_vec(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_duration_parse() {
        assert_eq!("1m".parse::<CandleDuration>().unwrap(), CandleDuration::Minute);
        assert_eq!(
            "5m".parse::<CandleDuration>(),
            Err(EngineError::InvalidDuration("5m".to_string()))
        );
    }

    #[test]
    fn test_truncate_zeroes_finer_fields() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 13, 47, 31).unwrap()
            + chrono::Duration::milliseconds(420);

        assert_eq!(
            CandleDuration::Second.truncate(t),
            Utc.with_ymd_and_hms(2024, 3, 9, 13, 47, 31).unwrap()
        );
        assert_eq!(
            CandleDuration::Minute.truncate(t),
            Utc.with_ymd_and_hms(2024, 3, 9, 13, 47, 0).unwrap()
        );
        assert_eq!(
            CandleDuration::Hour.truncate(t),
            Utc.with_ymd_and_hms(2024, 3, 9, 13, 0, 0).unwrap()
        );
        assert_eq!(
            CandleDuration::Day.truncate(t),
            Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_series_sorted_on_construction() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Candle::new("BTC_JPY", CandleDuration::Minute, t0 + chrono::Duration::minutes(1), 2.0, 2.0, 2.0, 2.0, 1.0);
        let earlier = Candle::new("BTC_JPY", CandleDuration::Minute, t0, 1.0, 1.0, 1.0, 1.0, 1.0);

        let series = CandleSeries::from_vec(vec![later, earlier]);
        assert_eq!(series.closes(), vec![1.0, 2.0]);
        assert_eq!(series.first().map(|c| c.time), Some(t0));
    }
}
