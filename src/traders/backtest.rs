// src/traders/backtest.rs
use crate::connectors::traits::{Stop, Trader};
use crate::core::budget::Budget;
use crate::core::position::total_profit;
use crate::strategies::traits::Rule;
use crate::traders::recoverable;
use crate::types::{Action, Candle, Order, OrderType, Position, PositionStatus, Side, Signal};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

const BACKTEST_USER: &str = "backtest";
const FILLED: &str = "filled";

/// Fills every signal at the candle close and keeps the ledger in memory.
/// Stops on its own once no candle has arrived for `idle_timeout`.
pub struct BacktestTrader {
    budget: Box<dyn Budget>,
    positions: Vec<Position>,
    idle_timeout: Duration,
}

impl BacktestTrader {
    pub fn new(budget: Box<dyn Budget>, idle_timeout: Duration) -> Self {
        Self {
            budget,
            positions: Vec::new(),
            idle_timeout,
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    fn handle_candle(&mut self, candle: &Candle, rule: &mut dyn Rule) -> Result<()> {
        let (side, action) = match rule.assert(candle) {
            Signal::Advice(side, action) => (side, action),
            Signal::Hold => return Ok(()),
        };

        let result = match action {
            Action::Open => self.open(side, candle),
            Action::Close => self.close(candle),
        };

        match result {
            Err(e) if recoverable(&e) => {
                warn!(%side, %action, price = candle.close_price, error = %e, "trader : skipping iteration");
                Ok(())
            }
            other => other,
        }
    }

    fn has_open_position(&self) -> bool {
        self.positions.last().is_some_and(Position::is_open)
    }

    fn open(&mut self, side: Side, candle: &Candle) -> Result<()> {
        if self.has_open_position() {
            // we can't leave a position open, therefore we have to force close it
            info!(budget = %self.budget, "trader : open : force closing previous position");
            self.close(candle)?;
        }

        let quantity = self.budget.open(side, candle)?;
        let id = Uuid::new_v4().to_string();
        let opening = Order {
            id: Uuid::new_v4().to_string(),
            symbol_id: candle.symbol_id.clone(),
            position_id: id.clone(),
            creation_time: candle.close_time,
            price: candle.close_price,
            quantity,
            status: FILLED.to_string(),
            order_type: OrderType::Market,
            side,
        };

        info!(
            position = %id,
            %side,
            price = candle.close_price,
            quantity,
            budget = %self.budget,
            "trader : opened"
        );
        self.positions.push(Position {
            id,
            symbol_id: candle.symbol_id.clone(),
            side,
            status: PositionStatus::Open,
            creation_time: candle.close_time,
            user: BACKTEST_USER.to_string(),
            symbol: candle.symbol.clone(),
            orders: vec![opening],
        });
        Ok(())
    }

    fn close(&mut self, candle: &Candle) -> Result<()> {
        let Some(position) = self.positions.last_mut().filter(|p| p.is_open()) else {
            info!("trader : close : no open position, skipping this iteration");
            return Ok(());
        };

        self.budget.close(position.side, position.status, candle)?;

        let closing = Order {
            id: Uuid::new_v4().to_string(),
            creation_time: candle.close_time,
            price: candle.close_price,
            ..position.closing_order()?
        };
        position.orders.push(closing);
        position.status = PositionStatus::Closed;

        info!(
            position = %position.id,
            side = %position.side,
            price = candle.close_price,
            profit = position.profit(),
            budget = %self.budget,
            "trader : closed"
        );
        Ok(())
    }
}

#[async_trait]
impl Trader for BacktestTrader {
    async fn trade(
        &mut self,
        mut stop: Stop,
        mut candles: mpsc::Receiver<Candle>,
        rule: &mut dyn Rule,
    ) -> Result<()> {
        info!(budget = %self.budget, rule = %rule.name(), "trader : starting backtest");

        loop {
            tokio::select! {
                _ = &mut stop => break,
                received = timeout(self.idle_timeout, candles.recv()) => match received {
                    Ok(Some(candle)) => self.handle_candle(&candle, rule)?,
                    Ok(None) => break,
                    Err(_) => {
                        info!(idle_ms = self.idle_timeout.as_millis() as u64, "trader : no more candles");
                        break;
                    }
                },
            }
        }

        info!(positions = self.positions.len(), "trader : gracefully shutting down trader");
        Ok(())
    }

    async fn profit(&self) -> f64 {
        for (i, p) in self.positions.iter().enumerate() {
            if let [opening, closing] = p.orders.as_slice() {
                info!(
                    operation = i,
                    side = %p.side,
                    opened_at = %opening.creation_time.format("%a %b %e %H:%M"),
                    closed_at = %closing.creation_time.format("%a %b %e %H:%M"),
                    open = opening.price * opening.quantity,
                    close = closing.price * closing.quantity,
                    profit = p.profit(),
                    "trader : position"
                );
            }
        }

        let total = total_profit(&self.positions);
        info!(total, "trader : total profit");
        total
    }
}
