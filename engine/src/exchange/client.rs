//! Exchange client boundary

use crate::data::Ticker;
use crate::exchange::{Order, OrderQuery, OrderRequest};
use crate::portfolio::Balance;
use crate::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Exchange collaborator consumed by the controller and ingestion loop.
///
/// Transport failures surface as [`EngineError::Exchange`]; unexpected
/// payloads as [`EngineError::MalformedExchangeResponse`].
///
/// [`EngineError::Exchange`]: crate::EngineError::Exchange
/// [`EngineError::MalformedExchangeResponse`]: crate::EngineError::MalformedExchangeResponse
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    async fn get_balance(&self) -> Result<Vec<Balance>>;

    async fn get_ticker(&self, product_code: &str) -> Result<Ticker>;

    /// Submit an order, returning its acceptance id (empty when refused)
    async fn send_order(&self, order: &OrderRequest) -> Result<String>;

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;

    /// Subscribe to the realtime ticker; the stream lives for the process
    async fn stream_ticks(&self, product_code: &str) -> Result<mpsc::Receiver<Ticker>>;
}
