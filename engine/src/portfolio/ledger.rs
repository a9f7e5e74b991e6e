//! Signal ledger: executed buy/sell history and profit accounting

use crate::data::SignalStore;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// One executed signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub time: DateTime<Utc>,
    pub product_code: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
}

/// Serializable view of a ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub signals: Vec<SignalEvent>,
    pub profit: f64,
}

/// Time-ordered signals of one instrument.
///
/// Sides strictly alternate starting with a buy, and every new signal must
/// be strictly later than the last one.
#[derive(Debug, Clone, Default)]
pub struct SignalLedger {
    product_code: String,
    signals: Vec<SignalEvent>,
}

impl SignalLedger {
    pub fn new(product_code: impl Into<String>) -> Self {
        Self {
            product_code: product_code.into(),
            signals: Vec::new(),
        }
    }

    /// Seed from persisted signals, oldest first
    pub fn from_signals(product_code: impl Into<String>, signals: Vec<SignalEvent>) -> Self {
        Self {
            product_code: product_code.into(),
            signals,
        }
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn signals(&self) -> &[SignalEvent] {
        &self.signals
    }

    pub fn last(&self) -> Option<&SignalEvent> {
        self.signals.last()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn can_buy(&self, time: DateTime<Utc>) -> bool {
        match self.signals.last() {
            None => true,
            Some(last) => last.side == Side::Sell && last.time < time,
        }
    }

    pub fn can_sell(&self, time: DateTime<Utc>) -> bool {
        match self.signals.last() {
            None => false,
            Some(last) => last.side == Side::Buy && last.time < time,
        }
    }

    fn can(&self, side: Side, time: DateTime<Utc>) -> bool {
        match side {
            Side::Buy => self.can_buy(time),
            Side::Sell => self.can_sell(time),
        }
    }

    fn event(&self, side: Side, time: DateTime<Utc>, price: f64, size: f64) -> SignalEvent {
        SignalEvent {
            time,
            product_code: self.product_code.clone(),
            side,
            price,
            size,
        }
    }

    /// Append a buy without persisting; `false` when ineligible
    pub fn buy(&mut self, time: DateTime<Utc>, price: f64, size: f64) -> bool {
        self.append(Side::Buy, time, price, size)
    }

    /// Append a sell without persisting; `false` when ineligible
    pub fn sell(&mut self, time: DateTime<Utc>, price: f64, size: f64) -> bool {
        self.append(Side::Sell, time, price, size)
    }

    fn append(&mut self, side: Side, time: DateTime<Utc>, price: f64, size: f64) -> bool {
        if !self.can(side, time) {
            debug!(%side, %time, "signal rejected by ledger");
            return false;
        }
        let event = self.event(side, time, price, size);
        self.signals.push(event);
        true
    }

    /// Validate, optionally persist, then append.
    ///
    /// Returns `Ok(false)` when the alternation rule rejects the signal. A
    /// storage failure leaves the ledger unchanged.
    pub async fn record(
        &mut self,
        side: Side,
        time: DateTime<Utc>,
        price: f64,
        size: f64,
        store: Option<&dyn SignalStore>,
    ) -> Result<bool> {
        if !self.can(side, time) {
            debug!(%side, %time, "signal rejected by ledger");
            return Ok(false);
        }
        let event = self.event(side, time, price, size);
        if let Some(store) = store {
            store.append_signal(&event).await?;
        }
        self.signals.push(event);
        Ok(true)
    }

    /// Realised profit.
    ///
    /// An open position is not counted: while holding, the total as of the
    /// last sell is returned. A leading sell is skipped.
    pub fn profit(&self) -> f64 {
        let mut total = 0.0;
        let mut last_realized = 0.0;
        let mut holding = false;

        for (i, signal) in self.signals.iter().enumerate() {
            match signal.side {
                Side::Sell if i == 0 => continue,
                Side::Buy => {
                    total -= signal.price * signal.size;
                    holding = true;
                }
                Side::Sell => {
                    total += signal.price * signal.size;
                    holding = false;
                    last_realized = total;
                }
            }
        }

        if holding {
            last_realized
        } else {
            total
        }
    }

    /// Sub-ledger of events at or after `time`
    pub fn collect_after(&self, time: DateTime<Utc>) -> SignalLedger {
        let start = self
            .signals
            .iter()
            .position(|s| s.time >= time)
            .unwrap_or(self.signals.len());
        Self::from_signals(self.product_code.clone(), self.signals[start..].to_vec())
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            signals: self.signals.clone(),
            profit: self.profit(),
        }
    }
}
