// src/core/position.rs
use crate::error::EngineError;
use crate::types::{Order, Position, PositionStatus, Side};

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Builds the order that closes this position: opposite side, same
    /// quantity as the opening order. Only valid while exactly one order exists.
    pub fn closing_order(&self) -> Result<Order, EngineError> {
        match self.orders.as_slice() {
            [opening] => Ok(Order {
                side: self.side.opposite(),
                ..opening.clone()
            }),
            orders => Err(EngineError::UnexpectedOrderCount {
                expected: 1,
                got: orders.len(),
            }),
        }
    }

    /// Realized profit in the alt coin. Zero unless the position is closed
    /// with exactly two orders.
    pub fn profit(&self) -> f64 {
        match (self.status, self.orders.as_slice()) {
            (PositionStatus::Closed, [opening, closing]) => {
                let opened = opening.price * opening.quantity;
                let closed = closing.price * closing.quantity;
                match self.side {
                    Side::Buy => closed - opened,
                    Side::Sell => opened - closed,
                }
            }
            _ => 0.0,
        }
    }
}

/// Sums realized profit over a set of positions.
pub fn total_profit<'a>(positions: impl IntoIterator<Item = &'a Position>) -> f64 {
    positions.into_iter().map(Position::profit).sum()
}
