// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule wants the trader to do with a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    Close,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Open => "OPEN",
            Action::Close => "CLOSE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Advice(Side, Action),
    Hold,
}

/// OHLCV bar. Sequencing identity is `open_time`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Candle {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing)]
    pub symbol_id: String,
    pub symbol: String,
    pub interval: String,
    pub open_time: DateTime<Utc>,
    pub open_price: f64,
    pub close_price: f64,
    pub close_time: DateTime<Utc>,
    pub low: f64,
    pub high: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_green(&self) -> bool {
        self.close_price > self.open_price
    }

    pub fn is_red(&self) -> bool {
        self.close_price < self.open_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    #[default]
    Market,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "order_id")]
    pub id: String,
    #[serde(default)]
    pub symbol_id: String,
    #[serde(default)]
    pub position_id: String,
    pub creation_time: DateTime<Utc>,
    pub price: f64,
    pub quantity: f64,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub order_type: OrderType,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "position_id")]
    pub id: String,
    #[serde(default)]
    pub symbol_id: String,
    pub side: Side,
    pub status: PositionStatus,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub orders: Vec<Order>,
}

// The API encodes an empty order list as `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Market a strategy trades on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TradingPair {
    pub symbol: String,
    pub symbol_id: String,
    pub interval: String,
    /// Bars fetched up front to warm the indicators.
    pub warming: u32,
}
