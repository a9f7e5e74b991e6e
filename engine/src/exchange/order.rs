//! Order management

use crate::portfolio::Side;
use serde::{Deserialize, Serialize};

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
}

/// Time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good 'til cancelled
    #[serde(rename = "GTC")]
    GoodTilCancelled,
}

/// Order state as reported by the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderState {
    Active,
    Completed,
    Canceled,
    Expired,
    Rejected,
}

/// New order request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub product_code: String,
    pub order_type: OrderType,
    pub side: Side,
    pub size: f64,
    pub minute_to_expire: u32,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    /// Market order with the given expiry, good 'til cancelled
    pub fn market(product_code: impl Into<String>, side: Side, size: f64, minute_to_expire: u32) -> Self {
        Self {
            product_code: product_code.into(),
            order_type: OrderType::Market,
            side,
            size,
            minute_to_expire,
            time_in_force: TimeInForce::GoodTilCancelled,
        }
    }
}

/// Query for one order by its acceptance id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub product_code: String,
    pub acceptance_id: String,
}

/// Order as listed by the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub acceptance_id: String,
    pub product_code: String,
    pub side: Side,
    pub state: OrderState,
    pub average_price: f64,
    pub size: f64,
}

impl Order {
    /// Check if order is filled
    pub fn is_completed(&self) -> bool {
        self.state == OrderState::Completed
    }
}

/// Size for an order: deduct the fee and truncate to 4 decimal places
pub fn adjust_size(size: f64, fee_rate: f64) -> f64 {
    let size = size * (1.0 - fee_rate);
    (size * 10_000.0).floor() / 10_000.0
}
