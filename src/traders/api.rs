// src/traders/api.rs
use crate::connectors::messages::{NewOrder, NewPosition};
use crate::connectors::traits::{ExecutionBackend, Stop, Trader};
use crate::core::budget::Budget;
use crate::core::position::total_profit;
use crate::strategies::traits::Rule;
use crate::traders::recoverable;
use crate::types::{Action, Candle, Position, Side, Signal};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Executes signals against the trading API. At most one position is open
/// at any time; it is kept in memory and recovered from the API after a
/// restart.
pub struct ApiTrader {
    backend: Arc<dyn ExecutionBackend>,
    budget: Box<dyn Budget>,
    current_position: Option<Position>,
}

impl ApiTrader {
    pub fn new(backend: Arc<dyn ExecutionBackend>, budget: Box<dyn Budget>) -> Self {
        Self {
            backend,
            budget,
            current_position: None,
        }
    }

    pub fn current_position(&self) -> Option<&Position> {
        self.current_position.as_ref()
    }

    async fn handle_candle(&mut self, candle: &Candle, rule: &mut dyn Rule) -> Result<()> {
        let (side, action) = match rule.assert(candle) {
            Signal::Advice(side, action) => (side, action),
            Signal::Hold => return Ok(()),
        };

        let result = match action {
            Action::Open => self.open(side, candle).await.map(Some),
            Action::Close => self.close(candle).await,
        };

        match result {
            Ok(Some(pos)) => {
                info!(
                    position = %pos.id,
                    %side,
                    %action,
                    price = candle.close_price,
                    budget = %self.budget,
                    "trader : position updated"
                );
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) if recoverable(&e) => {
                warn!(%side, %action, price = candle.close_price, error = %e, "trader : skipping iteration");
                Ok(())
            }
            Err(e) => {
                error!(%side, %action, price = candle.close_price, error = %e, "trader : unable to update position");
                Err(e)
            }
        }
    }

    async fn open(&mut self, side: Side, candle: &Candle) -> Result<Position> {
        // We can only open a position if there is no position already open
        if let Some(current) = &self.current_position {
            info!(
                position = %current.id,
                side = %current.side,
                budget = %self.budget,
                "trader : open : force closing previous position"
            );
            self.close(candle).await?;
        }

        let quantity = self.budget.open(side, candle)?;
        let payload = NewPosition {
            symbol_id: candle.symbol_id.clone(),
            side,
        };
        let position = self.backend.create_position(payload, quantity).await?;

        self.current_position = Some(position.clone());
        Ok(position)
    }

    /// `Ok(None)` when there is nothing open to close.
    async fn close(&mut self, candle: &Candle) -> Result<Option<Position>> {
        if self.current_position.is_none() {
            self.current_position = self.recover_position().await?;
        }

        let Some(current) = &self.current_position else {
            info!("trader : close : unable to find an opened position, skipping this iteration");
            return Ok(None);
        };

        if !current.is_open() {
            info!(position = %current.id, "trader : close : position already closed, skipping this iteration");
            self.current_position = None;
            return Ok(None);
        }

        self.budget.close(current.side, current.status, candle)?;

        let closing = current.closing_order()?;
        let order = NewOrder {
            position_id: current.id.clone(),
            quantity: closing.quantity,
            side: closing.side,
        };
        self.backend.create_order(order).await?;

        let id = current.id.clone();
        let closed = self.backend.close_position(&id).await?;
        self.current_position = None;

        Ok(closed)
    }

    // After a restart the in-memory position is gone; ask the API for it
    async fn recover_position(&self) -> Result<Option<Position>> {
        let last = self.backend.last_position().await?;
        Ok(last.filter(Position::is_open))
    }
}

#[async_trait]
impl Trader for ApiTrader {
    async fn trade(
        &mut self,
        mut stop: Stop,
        mut candles: mpsc::Receiver<Candle>,
        rule: &mut dyn Rule,
    ) -> Result<()> {
        info!(budget = %self.budget, rule = %rule.name(), "trader : starting to trade");

        loop {
            tokio::select! {
                _ = &mut stop => break,
                candle = candles.recv() => match candle {
                    Some(candle) => self.handle_candle(&candle, rule).await?,
                    None => break,
                },
            }
        }

        info!("trader : gracefully shutting down trader");
        Ok(())
    }

    async fn profit(&self) -> f64 {
        match self.backend.list_positions().await {
            Ok(positions) => total_profit(&positions),
            Err(e) => {
                error!(error = %e, "trader : unable to fetch positions from api");
                0.0
            }
        }
    }
}
