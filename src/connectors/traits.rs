use crate::connectors::messages::{NewOrder, NewPosition};
use crate::strategies::traits::Rule;
use crate::types::{Candle, Order, Position};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Fires (or is dropped) when a worker must shut down.
pub type Stop = oneshot::Receiver<()>;

#[async_trait]
pub trait Puller: Send {
    // Blocks until `stop` fires, pushing candles into `candles` meanwhile
    async fn pull(&mut self, stop: Stop, candles: mpsc::Sender<Candle>) -> Result<()>;
}

#[async_trait]
pub trait Trader: Send + Sync {
    // Consumes candles and asks the rule whether to open or close a position
    async fn trade(
        &mut self,
        stop: Stop,
        candles: mpsc::Receiver<Candle>,
        rule: &mut dyn Rule,
    ) -> Result<()>;

    async fn profit(&self) -> f64;
}

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Most recent candles first page first, `rows` per page.
    async fn candles(&self, symbol: &str, interval: &str, page: u32, rows: u32)
        -> Result<Vec<Candle>>;
}

#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn list_positions(&self) -> Result<Vec<Position>>;

    /// Last position recorded for this account, open or not.
    async fn last_position(&self) -> Result<Option<Position>>;

    /// Creates the position together with its opening order of `quantity`.
    async fn create_position(&self, position: NewPosition, quantity: f64) -> Result<Position>;

    async fn create_order(&self, order: NewOrder) -> Result<Order>;

    async fn close_position(&self, id: &str) -> Result<Option<Position>>;
}
