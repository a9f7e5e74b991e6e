//! bitFlyer Lightning client
//!
//! Private REST endpoints are signed with HMAC-SHA256 over
//! `timestamp + method + path?query + body`. Realtime ticks come from the
//! JSON-RPC websocket and are forwarded over an mpsc channel.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use engine::data::Ticker;
use engine::exchange::{ExchangeClient, Order, OrderQuery, OrderRequest, OrderState, OrderType, TimeInForce};
use engine::portfolio::{Balance, Side};
use engine::{EngineError, Result};
use futures::{SinkExt, StreamExt};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const BASE_URL: &str = "https://api.bitflyer.com";
const REALTIME_URL: &str = "wss://ws.lightstream.bitflyer.com/json-rpc";
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const TICK_BUFFER: usize = 1024;

type HmacSha256 = Hmac<Sha256>;

fn transport(e: impl std::fmt::Display) -> EngineError {
    EngineError::Exchange(e.to_string())
}

fn malformed(e: serde_json::Error) -> EngineError {
    EngineError::MalformedExchangeResponse(e.to_string())
}

/// Parse a bitFlyer timestamp. They are UTC and may omit the zone suffix.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|time| time.and_utc())
        .map_err(|_| EngineError::MalformedExchangeResponse(format!("timestamp {:?}", raw)))
}

#[derive(Debug, Deserialize)]
struct BalancePayload {
    currency_code: String,
    amount: f64,
    available: f64,
}

#[derive(Debug, Deserialize)]
struct TickerPayload {
    product_code: String,
    timestamp: String,
    tick_id: u64,
    best_bid: f64,
    best_ask: f64,
    best_bid_size: f64,
    best_ask_size: f64,
    total_bid_depth: f64,
    total_ask_depth: f64,
    ltp: f64,
    volume: f64,
    volume_by_product: f64,
}

impl TryFrom<TickerPayload> for Ticker {
    type Error = EngineError;

    fn try_from(p: TickerPayload) -> Result<Self> {
        Ok(Ticker {
            timestamp: parse_timestamp(&p.timestamp)?,
            product_code: p.product_code,
            tick_id: p.tick_id,
            best_bid: p.best_bid,
            best_ask: p.best_ask,
            best_bid_size: p.best_bid_size,
            best_ask_size: p.best_ask_size,
            total_bid_depth: p.total_bid_depth,
            total_ask_depth: p.total_ask_depth,
            ltp: p.ltp,
            volume: p.volume,
            volume_by_product: p.volume_by_product,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChildOrderBody<'a> {
    product_code: &'a str,
    child_order_type: OrderType,
    side: Side,
    size: f64,
    minute_to_expire: u32,
    time_in_force: TimeInForce,
}

impl<'a> From<&'a OrderRequest> for ChildOrderBody<'a> {
    fn from(order: &'a OrderRequest) -> Self {
        Self {
            product_code: &order.product_code,
            child_order_type: order.order_type,
            side: order.side,
            size: order.size,
            minute_to_expire: order.minute_to_expire,
            time_in_force: order.time_in_force,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChildOrderAck {
    #[serde(default)]
    child_order_acceptance_id: String,
}

#[derive(Debug, Deserialize)]
struct ChildOrderPayload {
    child_order_acceptance_id: String,
    product_code: String,
    side: Side,
    child_order_state: OrderState,
    #[serde(default)]
    average_price: f64,
    #[serde(default)]
    executed_size: f64,
}

impl From<ChildOrderPayload> for Order {
    fn from(p: ChildOrderPayload) -> Self {
        Order {
            acceptance_id: p.child_order_acceptance_id,
            product_code: p.product_code,
            side: p.side,
            state: p.child_order_state,
            average_price: p.average_price,
            size: p.executed_size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelMessage {
    method: String,
    params: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChannelParams {
    message: TickerPayload,
}

/// `None` for frames that carry no ticker (subscription acks, other methods)
fn decode_channel_message(text: &str) -> Option<Result<Ticker>> {
    let frame: ChannelMessage = serde_json::from_str(text).ok()?;
    if frame.method != "channelMessage" {
        return None;
    }
    let params = frame.params?;
    Some(
        serde_json::from_value::<ChannelParams>(params)
            .map_err(malformed)
            .and_then(|p| Ticker::try_from(p.message)),
    )
}

/// bitFlyer Lightning REST and realtime client
#[derive(Clone)]
pub struct BitflyerClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl BitflyerClient {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    fn sign(&self, timestamp: &str, method: &Method, path_and_query: &str, body: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes()).map_err(transport)?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_str().as_bytes());
        mac.update(path_and_query.as_bytes());
        mac.update(body.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: String,
    ) -> Result<(StatusCode, String)> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(transport)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let path_and_query = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        let timestamp = Utc::now().timestamp().to_string();
        let sign = self.sign(&timestamp, &method, &path_and_query, &body)?;
        debug!(%method, path = %path_and_query, "bitflyer request");

        let response = self
            .client
            .request(method, url)
            .header("ACCESS-KEY", &self.api_key)
            .header("ACCESS-TIMESTAMP", timestamp)
            .header("ACCESS-SIGN", sign)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        Ok((status, text))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let (status, text) = self.send(Method::GET, path, query, String::new()).await?;
        if !status.is_success() {
            return Err(EngineError::Exchange(format!("{} {}: {}", path, status, text)));
        }
        serde_json::from_str(&text).map_err(malformed)
    }

    async fn stream_realtime(channel: String, tx: mpsc::Sender<Ticker>) {
        while !tx.is_closed() {
            match Self::subscribe_once(&channel, &tx).await {
                Ok(()) => info!(%channel, "realtime stream ended"),
                Err(e) => error!(%channel, error = %e, "realtime stream failed"),
            }
            if tx.is_closed() {
                break;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
        info!(%channel, "tick receiver dropped, realtime stream stopped");
    }

    async fn subscribe_once(channel: &str, tx: &mpsc::Sender<Ticker>) -> Result<()> {
        let (ws, _) = connect_async(REALTIME_URL).await.map_err(transport)?;
        let (mut write, mut read) = ws.split();

        let subscribe = json!({
            "jsonrpc": "2.0",
            "method": "subscribe",
            "params": { "channel": channel }
        });
        write
            .send(Message::Text(subscribe.to_string()))
            .await
            .map_err(transport)?;
        info!(channel, "subscribed to realtime ticker");

        while let Some(message) = read.next().await {
            match message.map_err(transport)? {
                Message::Text(text) => match decode_channel_message(&text) {
                    Some(Ok(tick)) => {
                        if tx.send(tick).await.is_err() {
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => warn!(error = %e, "skipping malformed ticker"),
                    None => debug!(%text, "ignoring frame"),
                },
                Message::Ping(data) => write.send(Message::Pong(data)).await.map_err(transport)?,
                Message::Close(_) => return Ok(()),
                _ => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeClient for BitflyerClient {
    async fn get_balance(&self) -> Result<Vec<Balance>> {
        let balances: Vec<BalancePayload> = self.get("/v1/me/getbalance", &[]).await?;
        Ok(balances
            .into_iter()
            .map(|b| Balance::new(b.currency_code, b.amount, b.available))
            .collect())
    }

    async fn get_ticker(&self, product_code: &str) -> Result<Ticker> {
        let ticker: TickerPayload = self.get("/v1/ticker", &[("product_code", product_code)]).await?;
        Ticker::try_from(ticker)
    }

    async fn send_order(&self, order: &OrderRequest) -> Result<String> {
        let body = serde_json::to_string(&ChildOrderBody::from(order)).map_err(transport)?;
        let (status, text) = self.send(Method::POST, "/v1/me/sendchildorder", &[], body).await?;
        if !status.is_success() {
            warn!(%status, response = %text, "child order refused");
            return Ok(String::new());
        }
        let ack: ChildOrderAck = serde_json::from_str(&text).map_err(malformed)?;
        Ok(ack.child_order_acceptance_id)
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let orders: Vec<ChildOrderPayload> = self
            .get(
                "/v1/me/getchildorders",
                &[
                    ("product_code", query.product_code.as_str()),
                    ("child_order_acceptance_id", query.acceptance_id.as_str()),
                ],
            )
            .await?;
        Ok(orders.into_iter().map(Order::from).collect())
    }

    async fn stream_ticks(&self, product_code: &str) -> Result<mpsc::Receiver<Ticker>> {
        let (tx, rx) = mpsc::channel(TICK_BUFFER);
        let channel = format!("lightning_ticker_{}", product_code);
        tokio::spawn(Self::stream_realtime(channel, tx));
        Ok(rx)
    }
}
